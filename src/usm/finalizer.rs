//! Payload extraction from reassembled stream buffers.
//!
//! Each buffer still holds the stream's own header and metadata sections
//! followed by the payload and a trailing `#CONTENTS END` marker. The
//! finalizer cuts out the payload and derives the output file name.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::format::markers::MarkerOffsets;
use super::types::error::{Result, UsmError};
use super::types::models::{DroppedStream, ExtractedStream, StreamCounts, StreamKey};

/// Locates the payload window of a reassembled stream.
///
/// # Errors
/// `MissingBoundaryMarker` if neither header marker is present, or if no
/// `#CONTENTS END` marker follows the payload start.
pub fn payload_window(key: StreamKey, buffer: &[u8]) -> Result<Range<usize>> {
    let offsets = MarkerOffsets::find(buffer);
    debug!("Markers in {}: {:?}", key, offsets);
    offsets
        .payload_window()
        .map_err(|boundary| UsmError::MissingBoundaryMarker { key, boundary })
}

/// Derives the output path for a stream.
///
/// `<base>.<ext>`, or `<base>.<id as %08x>.<ext>` when more than one stream
/// of the same kind exists. A key whose numeric id is `shared` with another
/// key is named `<base>.<tag id as %08x>.<channel as %02x>.<ext>` instead.
pub fn output_name(base: &Path, key: StreamKey, counts: &StreamCounts, shared: bool) -> PathBuf {
    let kind = key.kind();
    let suffix = if shared {
        format!(".{:08x}.{:02x}.{}", key.tag_id(), key.channel(), kind.extension())
    } else if counts.for_kind(kind) > 1 {
        format!(".{:08x}.{}", key.numeric_id(), kind.extension())
    } else {
        format!(".{}", kind.extension())
    };
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Keys whose numeric id coincides with that of another key.
fn shared_ids<'a>(keys: impl IntoIterator<Item = &'a StreamKey>) -> HashSet<StreamKey> {
    let mut by_id: HashMap<u32, Vec<StreamKey>> = HashMap::new();
    for &key in keys {
        by_id.entry(key.numeric_id()).or_default().push(key);
    }
    by_id
        .into_values()
        .filter(|keys| keys.len() > 1)
        .flatten()
        .collect()
}

/// Slices every buffer down to its payload.
///
/// Streams with missing markers are returned separately; they never abort
/// the others.
pub fn finalize(
    streams: Vec<(StreamKey, Vec<u8>)>,
    counts: &StreamCounts,
    base: &Path,
) -> (Vec<ExtractedStream>, Vec<DroppedStream>) {
    let mut extracted = Vec::with_capacity(streams.len());
    let mut dropped = Vec::new();
    let shared = shared_ids(streams.iter().map(|(key, _)| key));
    if !shared.is_empty() {
        debug!("Streams with coinciding ids: {:?}", shared);
    }

    for (key, mut buffer) in streams {
        match payload_window(key, &buffer) {
            Ok(window) => {
                buffer.truncate(window.end);
                buffer.drain(..window.start);
                let file_name = output_name(base, key, counts, shared.contains(&key));
                debug!("Stream {} -> {} ({} bytes)", key, file_name.display(), buffer.len());
                extracted.push(ExtractedStream {
                    key,
                    file_name,
                    payload: buffer,
                });
            }
            Err(reason) => {
                warn!("Dropping stream {}: {}", key, reason);
                dropped.push(DroppedStream { key, reason });
            }
        }
    }

    (extracted, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usm::format::markers::{CONTENTS_END, HEADER_END, METADATA_END};
    use crate::usm::types::models::Boundary;
    use pretty_assertions::assert_eq;

    fn framed(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn names_single_and_multiple_streams() {
        let base = Path::new("movie.usm");
        let single = StreamCounts { video: 1, audio: 1, alpha: 1 };
        assert_eq!(output_name(base, StreamKey::Video(0), &single, false), PathBuf::from("movie.usm.m2v"));
        assert_eq!(output_name(base, StreamKey::Audio(0), &single, false), PathBuf::from("movie.usm.adx"));
        assert_eq!(output_name(base, StreamKey::Alpha(0), &single, false), PathBuf::from("movie.usm.alp"));

        let many_audio = StreamCounts { video: 1, audio: 2, alpha: 1 };
        assert_eq!(
            output_name(base, StreamKey::Audio(1), &many_audio, false),
            PathBuf::from("movie.usm.41465341.adx")
        );
        assert_eq!(output_name(base, StreamKey::Video(0), &many_audio, false), PathBuf::from("movie.usm.m2v"));
    }

    #[test]
    fn coinciding_ids_get_channel_suffixed_names() {
        let counts = StreamCounts { video: 0, audio: 3, alpha: 0 };
        let (extracted, dropped) = finalize(
            vec![
                (StreamKey::Audio(0x00), framed(&[HEADER_END, b"low", CONTENTS_END])),
                (StreamKey::Audio(0x40), framed(&[HEADER_END, b"high", CONTENTS_END])),
                (StreamKey::Audio(0x01), framed(&[HEADER_END, b"one", CONTENTS_END])),
            ],
            &counts,
            Path::new("m.usm"),
        );

        assert!(dropped.is_empty());
        let names: Vec<_> = extracted.iter().map(|s| s.file_name.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("m.usm.41465340.00.adx"),
                PathBuf::from("m.usm.41465340.40.adx"),
                PathBuf::from("m.usm.41465341.adx"),
            ]
        );
        assert_eq!(extracted[1].payload, b"high".to_vec());
    }

    #[test]
    fn keeps_bytes_between_markers() {
        let buffer = framed(&[b"junk", HEADER_END, b"meta", METADATA_END, b"PAYLOAD", CONTENTS_END, b"tail"]);
        let window = payload_window(StreamKey::Video(0), &buffer).unwrap();
        assert_eq!(&buffer[window], b"PAYLOAD");
    }

    #[test]
    fn finalize_drops_only_broken_streams() {
        let good = framed(&[HEADER_END, b"abc", CONTENTS_END]);
        let no_contents = framed(&[METADATA_END, b"abc"]);
        let no_header = framed(&[b"abc", CONTENTS_END]);
        let counts = StreamCounts { video: 1, audio: 2, alpha: 0 };

        let (extracted, dropped) = finalize(
            vec![
                (StreamKey::Audio(0), no_contents),
                (StreamKey::Video(0), good),
                (StreamKey::Audio(1), no_header),
            ],
            &counts,
            Path::new("x"),
        );

        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].key, StreamKey::Video(0));
        assert_eq!(extracted[0].payload, b"abc".to_vec());
        assert_eq!(extracted[0].file_name, PathBuf::from("x.m2v"));

        assert_eq!(dropped.len(), 2);
        assert!(matches!(
            dropped[0].reason,
            UsmError::MissingBoundaryMarker { key: StreamKey::Audio(0), boundary: Boundary::Contents }
        ));
        assert!(matches!(
            dropped[1].reason,
            UsmError::MissingBoundaryMarker { key: StreamKey::Audio(1), boundary: Boundary::Header }
        ));
        assert!(!dropped[0].reason.is_fatal());
    }
}
