/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Lazy decoding of whole PGS streams.
//!
//! Each sequence pulls from its source only as far as needed to produce the next item, so a
//! caller may stop at any point without the rest of the stream being read. Every sequence
//! owns its own epoch state; independent sources can be decoded side by side.


use super::{
    dataset::{DataSets, ReadError as DataSetReadError},
    epoch::{Composition, EpochState, ResolveError},
    raster::RasterImage,
};
use std::{
    fs::File,
    io::{BufReader, Read, Result as IoResult},
    path::Path,
};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for stream decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// The error type for [`Compositions`] and [`Images`].
#[derive(ThisError, Debug)]
pub enum DecodeError {
    /// A data set could not be read from the source.
    #[error("data set read error")]
    DataSetError {
        #[from]
        source: DataSetReadError,
    },
    /// A data set was read but its composition could not be resolved.
    #[error("composition resolution error")]
    ResolveError {
        #[from]
        source: ResolveError,
    },
}

impl DecodeError {

    /// Whether the sequence that produced this error will keep producing items.
    pub fn leaves_stream_aligned(&self) -> bool {
        match self {
            DecodeError::DataSetError { source } => source.leaves_stream_aligned(),
            DecodeError::ResolveError { .. } => true,
        }
    }
}

/// Returns the lazy sequence of data sets in a source.
pub fn decode_data_sets<R: Read>(input: R) -> DataSets<R> {
    DataSets::new(input)
}

/// Returns the lazy sequence of resolved compositions in a source. Data sets whose
/// composition declares no objects produce nothing.
pub fn decode_compositions<R: Read>(input: R) -> Compositions<R> {
    Compositions::new(input)
}

/// Returns the lazy sequence of images in a source: one per composition object, in
/// composition order.
pub fn decode_images<R: Read>(input: R) -> Images<R> {
    Images::new(input)
}

/// Opens a file and returns the lazy sequence of data sets in it.
pub fn decode_data_sets_from_path<P: AsRef<Path>>(
    path: P,
) -> IoResult<DataSets<BufReader<File>>> {
    Ok(decode_data_sets(BufReader::new(File::open(path)?)))
}

/// Opens a file and returns the lazy sequence of images in it.
pub fn decode_images_from_path<P: AsRef<Path>>(path: P) -> IoResult<Images<BufReader<File>>> {
    Ok(decode_images(BufReader::new(File::open(path)?)))
}

/// A lazy sequence of resolved compositions.
pub struct Compositions<R> {
    data_sets: DataSets<R>,
    state: EpochState,
}

impl<R: Read> Compositions<R> {

    pub fn new(input: R) -> Self {
        Self {
            data_sets: DataSets::new(input),
            state: EpochState::new(),
        }
    }

    /// The epoch state as of the last data set read.
    pub fn state(&self) -> &EpochState {
        &self.state
    }
}

impl<R: Read> Iterator for Compositions<R> {

    type Item = DecodeResult<Composition>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let data_set = match self.data_sets.next()? {
                Ok(data_set) => data_set,
                Err(err) => return Some(Err(err.into())),
            };
            match self.state.process(&data_set) {
                Ok(Some(composition)) => return Some(Ok(composition)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// A lazy sequence of rendered images. Each image is rendered only when it is requested.
pub struct Images<R> {
    compositions: Compositions<R>,
    current: Option<Composition>,
    next_object: usize,
}

impl<R: Read> Images<R> {

    pub fn new(input: R) -> Self {
        Self {
            compositions: Compositions::new(input),
            current: None,
            next_object: 0,
        }
    }
}

impl<R: Read> Iterator for Images<R> {

    type Item = DecodeResult<RasterImage>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {

            if let Some(composition) = &self.current {
                if let Some(object) = composition.objects.get(self.next_object) {
                    self.next_object += 1;
                    return Some(Ok(object.render(&composition.palette)))
                }
            }

            match self.compositions.next()? {
                Ok(composition) => {
                    self.current = Some(composition);
                    self.next_object = 0;
                }
                Err(err) => {
                    self.current = None;
                    return Some(Err(err))
                }
            }
        }
    }
}
