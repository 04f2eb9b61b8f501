/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    DataSet,
    super::segment::{
        ReadError as SegmentReadError,
        ReadSegmentExt,
        SegmentKind,
    },
};
use std::io::Read;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for data-set-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [`ReadDataSetExt`].
#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    /// The source ran out before an end segment closed the data set.
    #[error("stream ended before the data set's end segment")]
    IncompleteDataSet,
}

impl ReadError {

    /// Whether reading may continue with the next segment after this error.
    pub fn leaves_stream_aligned(&self) -> bool {
        match self {
            ReadError::SegmentError { source } => source.leaves_stream_aligned(),
            ReadError::IncompleteDataSet => false,
        }
    }
}

/// Allows reading data sets from a source.
pub trait ReadDataSetExt {

    /// Reads segments up to and including the next end segment. A source that is already
    /// exhausted yields [`ReadError::IncompleteDataSet`].
    fn read_data_set(&mut self) -> ReadResult<DataSet>;

    /// Like [`read_data_set`](Self::read_data_set), but returns `None` if the source is
    /// exhausted before the first segment.
    fn read_next_data_set(&mut self) -> ReadResult<Option<DataSet>>;
}

impl<T> ReadDataSetExt for T where
    T: Read,
{

    fn read_data_set(&mut self) -> ReadResult<DataSet> {
        self.read_next_data_set()?.ok_or(ReadError::IncompleteDataSet)
    }

    fn read_next_data_set(&mut self) -> ReadResult<Option<DataSet>> {

        let mut segments = Vec::new();

        loop {

            let segment = match self.read_next_segment()? {
                Some(segment) => segment,
                None if segments.is_empty() => return Ok(None),
                None => return Err(ReadError::IncompleteDataSet),
            };
            let end = segment.kind() == SegmentKind::End;

            segments.push(segment);

            if end {
                break
            }
        }

        Ok(Some(DataSet { segments }))
    }
}

/// A lazy sequence of the data sets in a source.
///
/// After an error that leaves the source on a segment boundary, the rest of the broken data
/// set (up to and including its end segment) is skipped and the sequence continues with the
/// data set that follows. After any other error it ends.
pub struct DataSets<R> {
    input: R,
    skipping: bool,
    done: bool,
}

impl<R: Read> DataSets<R> {

    pub fn new(input: R) -> Self {
        Self { input, skipping: false, done: false }
    }

    /// Gives back the underlying source.
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Discards segments up to and including the next end segment.
    fn skip_broken_data_set(&mut self) -> ReadResult<()> {
        loop {
            match self.input.read_next_segment() {
                Ok(Some(segment)) if segment.kind() == SegmentKind::End => {
                    return Ok(())
                }
                Ok(Some(segment)) => {
                    tracing::debug!(
                        pts = segment.pts,
                        kind = %segment.kind(),
                        "skipping segment of broken data set"
                    );
                }
                Ok(None) => {
                    return Ok(())
                }
                Err(err) if err.leaves_stream_aligned() => {
                    tracing::warn!(error = %err, "skipping unreadable segment of broken data set");
                }
                Err(err) => {
                    return Err(err.into())
                }
            }
        }
    }
}

impl<R: Read> Iterator for DataSets<R> {

    type Item = ReadResult<DataSet>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.done {
            return None
        }

        if self.skipping {
            self.skipping = false;
            if let Err(err) = self.skip_broken_data_set() {
                self.done = true;
                return Some(Err(err))
            }
        }

        match self.input.read_next_data_set() {
            Ok(Some(data_set)) => Some(Ok(data_set)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                if err.leaves_stream_aligned() {
                    self.skipping = true;
                } else {
                    self.done = true;
                }
                Some(Err(err))
            }
        }
    }
}
