//! The MIME walker: the recursive-descent driver that turns
//! a byte source into a sequence of sink writes, threading recursion
//! depth explicitly and sharing a single
//! [`BoundaryStack`] and [`NameStack`] across the whole top-level
//! message.

use mailrip_types::{ContentTransferEncoding, ContentType, ErrorKind, HeaderRecord, MimePart, Termination};
use tracing::{debug, instrument, warn};

use crate::boundary::{BoundaryMatch, BoundaryStack};
use crate::config::Config;
use crate::decode::{self, DecodeEnd};
use crate::filename::{self, WeakRandom};
use crate::header;
use crate::namestack::NameStack;
use crate::sink::OutputSink;
use crate::source::ByteSource;
#[cfg(feature = "ole")]
use crate::ole;
#[cfg(feature = "tnef")]
use crate::tnef;

/// Mutable state shared across one top-level message's whole recursive
/// walk. Grouped into one record so `walk_part` doesn't need
/// an ever-growing parameter list.
struct WalkState<'a, S: OutputSink> {
    config: &'a Config,
    sink: &'a mut S,
    names: NameStack,
    boundary: BoundaryStack,
    random: WeakRandom,
    header_record: HeaderRecord,
    /// Set while walking a `multipart/appledouble`'s children, to the
    /// parent's own declared name; consumed by the immediate
    /// `application/applefile` child only.
    pending_appledouble_filename: Option<String>,
}

/// Parse and unpack one complete message, writing every extracted part
/// to `sink`. Returns the outer message's header record (subject, from,
/// to, defect histogram) once the walk completes.
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn extract_message<S: OutputSink>(
    bytes: Vec<u8>,
    config: &Config,
    sink: &mut S,
) -> crate::error::Result<HeaderRecord> {
    let mut state = WalkState {
        config,
        sink,
        names: NameStack::new(),
        boundary: BoundaryStack::new(),
        random: WeakRandom::new(0x9E37_79B9),
        header_record: HeaderRecord::new(),
        pending_appledouble_filename: None,
    };
    let mut source = ByteSource::from_bytes(bytes);
    walk_part(&mut source, &mut state, 0)?;
    if !state.header_record.defects.is_empty() {
        debug!(total = state.header_record.defects.total(), "message carries defects");
    }
    if !state.header_record.errors.is_empty() {
        debug!(total = state.header_record.errors.total(), "message registered non-fatal errors");
    }
    state.sink.report_defects(&state.header_record.defects);
    state.sink.report_errors(&state.header_record.errors);
    Ok(state.header_record)
}

/// Walk one MIME node: parse its headers, then dispatch on content type.
/// Returns the reason this node's body stopped being read, so a
/// multipart parent knows whether a sibling follows.
#[instrument(skip_all, fields(depth))]
fn walk_part<S: OutputSink>(
    source: &mut ByteSource,
    state: &mut WalkState<S>,
    depth: u32,
) -> crate::error::Result<Termination> {
    if depth > state.config.max_recursion_level {
        warn!(depth, limit = state.config.max_recursion_level, "recursion limit reached");
        return Ok(Termination::RecursionLimitReached);
    }

    let (mut part, block) = header::parse_part_headers(source, state.config.header_longsearch, depth);
    debug!(depth, content_type = %part.content_type, "walking part");
    if depth == 0 {
        header::apply_message_headers(&mut state.header_record, &block);
    } else {
        state.header_record.defects.merge(&part.defects);
    }

    if part.content_type.is_applefile() {
        let inherited = state.pending_appledouble_filename.take();
        if part.filename.is_none() {
            part.filename = Some(match &inherited {
                Some(name) => format!("{name}.applemeta"),
                None => "applefile".to_string(),
            });
        }
        part.inherited_appledouble_filename = inherited;
    } else if part.content_type.is_appledouble() {
        state.pending_appledouble_filename = part.declared_names().first().map(|s| s.to_string());
    }

    if part.content_type.is_multipart() {
        walk_multipart(source, state, &mut part)
    } else {
        walk_leaf(source, state, &part)
    }
}

/// Drive the Preamble → Part → Epilogue → Closed state machine for one
/// multipart node.
fn walk_multipart<S: OutputSink>(
    source: &mut ByteSource,
    state: &mut WalkState<S>,
    part: &mut MimePart,
) -> crate::error::Result<Termination> {
    let Some(boundary) = part.boundary.clone() else {
        // No boundary declared: nothing to recurse into structurally;
        // treat the remainder as a single opaque leaf.
        return walk_leaf(source, state, part);
    };

    // An unmatched opening quote on `boundary=` (spec §4.2) leaves two
    // plausible readings; both are pushed here so the match discipline
    // below discards the wrong one on first use instead of guessing now.
    let boundary_depth_before = state.boundary.depth();
    state.boundary.push(&boundary);
    if let Some(secondary) = part.boundary_secondary.clone() {
        state.boundary.push(&secondary);
    }
    let my_index_before = state.boundary.depth();

    // Preamble: text before the first separator, discarded.
    loop {
        if source.is_eof() {
            state.boundary.truncate(boundary_depth_before);
            return Ok(Termination::EndOfInput);
        }
        let Some(line) = source.read_line(false) else {
            state.boundary.truncate(boundary_depth_before);
            return Ok(Termination::EndOfInput);
        };
        let text = String::from_utf8_lossy(&line.content);
        let m = state.boundary.test_line(&text);
        if matches!(m, BoundaryMatch::NoMatch) {
            continue;
        }
        state.boundary.apply_match(m);
        if state.boundary.depth() < my_index_before {
            // Our own boundary never opened; an ancestor's matched first.
            return Ok(Termination::HitBoundary);
        }
        match m {
            BoundaryMatch::Terminator { .. } => {
                // The closing boundary fired while we were still in the
                // Preamble state: no child was ever opened. Spec §8
                // scenario 6 ("boundary declared but never opened").
                warn!("boundary crash: terminator seen before any separator opened a child");
                state.header_record.errors.record(ErrorKind::BoundaryCrash);
                state.boundary.truncate(boundary_depth_before);
                return scan_epilogue(source, state);
            }
            _ => break, // Separator: enter Part state.
        }
    }

    // Part: walk each child until our own terminator (or an ancestor's
    // boundary, or EOF) ends the sequence.
    loop {
        let child_depth = part.depth + 1;
        let end = walk_part(source, state, child_depth)?;
        match end {
            Termination::Ok | Termination::ZeroLengthPart => {
                // The child decoded cleanly to EOF with no boundary in
                // sight: treat as an implicit end (malformed input).
                if state.boundary.depth() < my_index_before {
                    return Ok(Termination::HitBoundary);
                }
                return Ok(Termination::EndOfInput);
            }
            Termination::EndOfInput => {
                if state.boundary.depth() > boundary_depth_before {
                    state.boundary.truncate(boundary_depth_before);
                }
                return Ok(Termination::EndOfInput);
            }
            Termination::RecursionLimitReached | Termination::Cancelled => {
                if state.boundary.depth() > boundary_depth_before {
                    state.boundary.truncate(boundary_depth_before);
                }
                return Ok(end);
            }
            Termination::HitBoundary => {
                // The child's decoder left the boundary line in the
                // source for us to consume and classify.
                let Some(line) = source.read_line(false) else {
                    if state.boundary.depth() > boundary_depth_before {
                        state.boundary.truncate(boundary_depth_before);
                    }
                    return Ok(Termination::EndOfInput);
                };
                let text = String::from_utf8_lossy(&line.content);
                let m = state.boundary.test_line(&text);
                state.boundary.apply_match(m);
                if state.boundary.depth() < my_index_before {
                    // Belonged to an ancestor: push the line back for it.
                    source.push_back_line(&line);
                    return Ok(Termination::HitBoundary);
                }
                match m {
                    BoundaryMatch::Terminator { .. } => {
                        state.boundary.truncate(boundary_depth_before);
                        return scan_epilogue(source, state);
                    }
                    BoundaryMatch::Separator { .. } => continue,
                    BoundaryMatch::NoMatch => {
                        // Consumed line didn't actually match (can
                        // happen if the child returned Ok without
                        // encountering the boundary the walker
                        // expected); treat as end of input.
                        if state.boundary.depth() > boundary_depth_before {
                            state.boundary.truncate(boundary_depth_before);
                        }
                        return Ok(Termination::EndOfInput);
                    }
                }
            }
        }
    }
}

/// Consume epilogue text after our own terminator has fired, stopping
/// (and pushing the line back) if it turns out to belong to an
/// ancestor's boundary.
fn scan_epilogue<S: OutputSink>(
    source: &mut ByteSource,
    state: &mut WalkState<S>,
) -> crate::error::Result<Termination> {
    loop {
        if source.is_eof() {
            return Ok(Termination::Ok);
        }
        let Some(line) = source.read_line(false) else {
            return Ok(Termination::Ok);
        };
        let text = String::from_utf8_lossy(&line.content);
        if !matches!(state.boundary.test_line(&text), BoundaryMatch::NoMatch) {
            source.push_back_line(&line);
            return Ok(Termination::Ok);
        }
    }
}

/// Decode and emit a single non-multipart part's body, including the
/// post-decode re-entry rules: nested `message/
/// rfc822`, `application/ms-tnef`, CFBF-signed payloads, and embedded
/// uuencoded fragments inside text bodies.
#[instrument(skip_all)]
fn walk_leaf<S: OutputSink>(
    source: &mut ByteSource,
    state: &mut WalkState<S>,
    part: &MimePart,
) -> crate::error::Result<Termination> {
    let mut body = Vec::new();
    let end = decode::decode_part_body(part.transfer_encoding, source, &state.boundary, |chunk| {
        body.extend_from_slice(chunk)
    });

    if part.transfer_encoding == ContentTransferEncoding::Base64 {
        if let Some(kind) = decode::base64::broken_mid_group(end, body.len()) {
            warn!(?kind, "content-transfer decoder ran out mid-group");
            state.header_record.errors.record(kind);
        }
    }

    if body.is_empty() && !state.config.keep_empty {
        return Ok(normalize_end(end));
    }

    let is_mht = state.config.decode_mht
        && part
            .declared_names()
            .first()
            .map(|n| n.to_ascii_lowercase().ends_with(".mht"))
            .unwrap_or(false);

    if part.content_type.is_message_rfc822() || is_mht {
        let mut nested = ByteSource::from_bytes(body);
        walk_part(&mut nested, state, part.depth + 1)?;
        return Ok(normalize_end(end));
    }

    #[cfg(feature = "tnef")]
    if part.content_type.is_ms_tnef() && state.config.decode_tnef {
        for (name, bytes) in tnef::extract(&body) {
            emit_attachment(state, &name, &[], bytes)?;
        }
        return Ok(normalize_end(end));
    }

    #[cfg(feature = "ole")]
    if looks_like_cfbf(&body) && state.config.decode_ole {
        let mut ole_errors = mailrip_types::ErrorHistogram::new();
        let attachments = ole::extract(&body, state.config, &mut ole_errors);
        if !ole_errors.is_empty() {
            warn!(total = ole_errors.total(), "CFBF container registered non-fatal errors");
        }
        state.header_record.errors.merge(&ole_errors);
        for (name, bytes) in attachments {
            emit_attachment(state, &name, &[], bytes)?;
        }
        return Ok(normalize_end(end));
    }

    if state.config.decode_uu && is_text_like(&part.content_type) {
        let frames = crate::decode::uuencode::extract_embedded(&body);
        for (name, bytes) in frames {
            emit_attachment(state, &name, &[], bytes)?;
        }
    }

    // The text body itself is always emitted too.
    emit_primary(state, part, body)?;
    Ok(normalize_end(end))
}

fn normalize_end(end: DecodeEnd) -> Termination {
    match end {
        DecodeEnd::Ok => Termination::Ok,
        DecodeEnd::HitBoundary(_) => Termination::HitBoundary,
        DecodeEnd::Eof => Termination::EndOfInput,
        DecodeEnd::ZeroLength => Termination::ZeroLengthPart,
    }
}

fn is_text_like(ct: &ContentType) -> bool {
    matches!(ct, ContentType::TextPlain | ContentType::TextOther(_))
}

#[cfg(feature = "ole")]
fn looks_like_cfbf(bytes: &[u8]) -> bool {
    bytes.len() >= 8
        && (&bytes[..8] == &mailrip_types::cfbf::SIGNATURE_CFBF[..]
            || &bytes[..8] == &mailrip_types::cfbf::SIGNATURE_CFBF_ALT[..])
}

/// Emit the part's own decoded body under its declared or synthesized
/// name. A part that declares more than one name
/// across `name=`, `filename=` and `Content-Location:` ("Multiple-name
/// exploit") has already had the primary picked here, with the rest
/// registered as sink aliases of the same output.
fn emit_primary<S: OutputSink>(
    state: &mut WalkState<S>,
    part: &MimePart,
    body: Vec<u8>,
) -> crate::error::Result<()> {
    let declared = part.declared_names();
    let chosen = declared
        .first()
        .map(|n| filename::sanitize(n, part.mac_resource))
        .unwrap_or_else(|| filename::default_name(state.config, part, state.names.next_default_index()));
    let aliases: Vec<String> = declared
        .get(1..)
        .unwrap_or(&[])
        .iter()
        .map(|n| filename::sanitize(n, part.mac_resource))
        .collect();
    emit_attachment(state, &chosen, &aliases, body)
}

/// Write one payload under `logical_name`, applying the collision
/// rename scheme if that name has already been used in this message
///, then register every entry in `aliases` as
/// an additional logical name for the same output.
fn emit_attachment<S: OutputSink>(
    state: &mut WalkState<S>,
    logical_name: &str,
    aliases: &[String],
    body: Vec<u8>,
) -> crate::error::Result<()> {
    let attempt = state.names.observe(logical_name);
    let name = if attempt > 1 {
        let random = state.random.next_u32();
        filename::rename_for_collision(logical_name, attempt - 1, state.config.rename_method, random)
    } else {
        logical_name.to_string()
    };

    let handle = state.sink.create(&name).map_err(|e| {
        warn!(name, error = %e, "sink create failed");
        crate::error::ExtractError::Kind(ErrorKind::SinkWriteFailed)
    })?;
    state.sink.write(handle, &body).map_err(|e| {
        warn!(name, error = %e, "sink write failed");
        crate::error::ExtractError::Kind(ErrorKind::SinkWriteFailed)
    })?;
    for alias in aliases {
        if alias == &name {
            continue;
        }
        state.names.observe(alias);
        if let Err(e) = state.sink.link(handle, alias) {
            warn!(alias, error = %e, "sink link failed");
        }
    }
    state.sink.close(handle).map_err(|e| {
        warn!(name, error = %e, "sink close failed");
        crate::error::ExtractError::Kind(ErrorKind::SinkWriteFailed)
    })?;

    Ok(())
}
