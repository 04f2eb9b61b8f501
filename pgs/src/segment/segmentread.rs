/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    CompositionObject,
    CompositionState,
    Crop,
    MAGIC_NUMBER,
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    SegmentKind,
    SegmentPayload,
    Sequence,
    WindowDefinition,
    WindowDefinitionSegment,
};
use std::io::{Cursor, Error as IoError, ErrorKind, Read};
use byteorder::{BigEndian, ReadBytesExt};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [`ReadSegmentExt`].
#[derive(ThisError, Debug)]
pub enum ReadError {
    /// The underlying source failed for a reason other than running out of bytes.
    #[error("segment IO error")]
    IoError {
        #[source]
        source: IoError,
    },
    /// The segment does not begin with `"PG"`.
    #[error("segment has unrecognized magic number")]
    MalformedStream,
    /// The source ended in the middle of a segment.
    #[error("stream ended in the middle of a segment")]
    TruncatedStream,
    #[error("segment has unrecognized kind 0x{kind:02X}")]
    UnknownSegmentKind {
        kind: u8,
    },
    /// The payload is shorter than the minimum its kind requires.
    #[error("{kind} payload is {actual} bytes but at least {expected} are required")]
    MalformedPayload {
        kind: SegmentKind,
        expected: usize,
        actual: usize,
    },
    /// The object data length field of an ODS disagrees with the payload size.
    #[error("object data length is {declared} but the payload holds {actual}")]
    LengthMismatch {
        declared: usize,
        actual: usize,
    },
}

impl ReadError {

    /// Whether the source is still positioned on a segment boundary after this error, so that
    /// reading may continue with the next segment.
    pub fn leaves_stream_aligned(&self) -> bool {
        matches!(
            self,
            ReadError::UnknownSegmentKind { .. }
                | ReadError::MalformedPayload { .. }
                | ReadError::LengthMismatch { .. }
        )
    }
}

impl From<IoError> for ReadError {

    fn from(source: IoError) -> Self {
        if source.kind() == ErrorKind::UnexpectedEof {
            ReadError::TruncatedStream
        } else {
            ReadError::IoError { source }
        }
    }
}

/// Allows reading segments from a source.
pub trait ReadSegmentExt {

    /// Reads the next segment. A source that is already exhausted yields
    /// [`ReadError::TruncatedStream`].
    fn read_segment(&mut self) -> ReadResult<Segment>;

    /// Reads the next segment, or returns `None` if the source is exhausted exactly at a
    /// segment boundary.
    fn read_next_segment(&mut self) -> ReadResult<Option<Segment>>;
}

impl<T> ReadSegmentExt for T where
    T: Read,
{

    fn read_segment(&mut self) -> ReadResult<Segment> {
        self.read_next_segment()?.ok_or(ReadError::TruncatedStream)
    }

    fn read_next_segment(&mut self) -> ReadResult<Option<Segment>> {

        let first = match read_first_byte(self)? {
            Some(first) => first,
            None => return Ok(None),
        };

        if u16::from_be_bytes([first, self.read_u8()?]) != MAGIC_NUMBER {
            return Err(ReadError::MalformedStream)
        }

        let pts = self.read_u32::<BigEndian>()?;
        let dts = self.read_u32::<BigEndian>()?;
        let kind_byte = self.read_u8()?;
        let size = self.read_u16::<BigEndian>()? as usize;

        let mut payload = vec![0u8; size];
        self.read_exact(&mut payload)?;

        let kind = SegmentKind::from_byte(kind_byte)
            .ok_or(ReadError::UnknownSegmentKind { kind: kind_byte })?;

        if payload.len() < kind.min_payload_size() {
            return Err(
                ReadError::MalformedPayload {
                    kind,
                    expected: kind.min_payload_size(),
                    actual: payload.len(),
                }
            )
        }

        let payload = match kind {
            SegmentKind::PaletteDefinition => {
                SegmentPayload::PaletteDefinition(parse_pds(&payload)?)
            }
            SegmentKind::ObjectDefinition => {
                SegmentPayload::ObjectDefinition(parse_ods(&payload)?)
            }
            SegmentKind::PresentationComposition => {
                SegmentPayload::PresentationComposition(parse_pcs(&payload)?)
            }
            SegmentKind::WindowDefinition => {
                SegmentPayload::WindowDefinition(parse_wds(&payload)?)
            }
            SegmentKind::End => SegmentPayload::End,
        };

        Ok(Some(Segment { pts, dts, payload }))
    }
}

fn read_first_byte<R: Read + ?Sized>(input: &mut R) -> ReadResult<Option<u8>> {

    let mut buffer = [0u8; 1];

    loop {
        match input.read(&mut buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buffer[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

fn parse_pcs(payload: &[u8]) -> ReadResult<PresentationCompositionSegment> {

    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        value => {
            tracing::warn!(value, "reading unrecognized composition state as normal");
            CompositionState::Normal
        }
    };
    let palette_update = input.read_u8()? == 0x80;
    let palette_id = input.read_u8()?;
    let object_count = input.read_u8()?;
    let mut composition_objects = Vec::new();

    // Each record's length depends on its own cropped flag, so records are read until the
    // payload runs out rather than by the declared count.
    while payload.len() - input.position() as usize >= 8 {

        let object_id = input.read_u16::<BigEndian>()?;
        let window_id = input.read_u8()?;
        let cropped = input.read_u8()? == 0x40;
        let x = input.read_u16::<BigEndian>()?;
        let y = input.read_u16::<BigEndian>()?;
        let remaining = payload.len() - input.position() as usize;

        // Some discs declare an object as cropped and then end the payload.
        let crop = if cropped && remaining >= 8 {
            Some(
                Crop {
                    x: input.read_u16::<BigEndian>()?,
                    y: input.read_u16::<BigEndian>()?,
                    width: input.read_u16::<BigEndian>()?,
                    height: input.read_u16::<BigEndian>()?,
                }
            )
        } else {
            if cropped {
                tracing::warn!(object_id, "composition object is cropped but has no crop fields");
            }
            None
        };

        composition_objects.push(
            CompositionObject {
                object_id,
                window_id,
                x,
                y,
                crop,
            }
        );
    }

    let trailing = payload.len() - input.position() as usize;

    if trailing > 0 {
        tracing::warn!(trailing, "ignoring trailing bytes in presentation composition segment");
    }

    Ok(
        PresentationCompositionSegment {
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update,
            palette_id,
            object_count,
            composition_objects,
        }
    )
}

fn parse_wds(payload: &[u8]) -> ReadResult<WindowDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let mut windows = Vec::new();

    // The declared count is informational; the payload size decides.
    let _count = input.read_u8()?;

    for _ in 0..(payload.len() - 1) / 9 {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(WindowDefinitionSegment { windows })
}

fn parse_pds(payload: &[u8]) -> ReadResult<PaletteDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let count = (payload.len() - 2) / 5;
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {

        let id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(payload: &[u8]) -> ReadResult<ObjectDefinitionSegment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = Sequence::from_flags(input.read_u8()?);
    let data_length = input.read_u24::<BigEndian>()? as usize;

    if data_length != payload.len() - 7 {
        return Err(
            ReadError::LengthMismatch {
                declared: data_length,
                actual: payload.len() - 7,
            }
        )
    }

    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let data = payload[input.position() as usize..].to_vec();

    Ok(
        ObjectDefinitionSegment {
            id,
            version,
            sequence,
            width,
            height,
            data,
        }
    )
}
