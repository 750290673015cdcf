//! Integration tests covering the "Concrete end-to-end
//! scenarios", driven through the public [`mailrip`] API with a
//! [`MemorySink`] so byte-exact results can be asserted directly.

use mailrip::config::Config;
use mailrip::sink::memory::MemorySink;
use mailrip::walker::extract_message;

fn run(message: &[u8]) -> (mailrip_types::HeaderRecord, MemorySink) {
    let mut sink = MemorySink::new();
    let record = extract_message(message.to_vec(), &Config::default(), &mut sink).unwrap();
    (record, sink)
}

/// 1. Plain text, no attachments.
#[test]
fn plain_text_message_yields_one_synthesized_attachment() {
    let msg = concat!("From: a@x\n", "To: b@y\n", "Subject: hi\n", "\n", "hello\n");
    let (record, sink) = run(msg.as_bytes());

    assert_eq!(sink.attachments().len(), 1);
    assert_eq!(sink.attachments()[0].name, "textfile0");
    assert_eq!(sink.attachments()[0].bytes, b"hello\n");
    assert_eq!(record.defects.total(), 0);
}

/// 2. Single base64 attachment alongside a plain-text sibling.
#[test]
fn multipart_with_base64_attachment() {
    let msg = concat!(
        "Content-Type: multipart/mixed; boundary=\"B\"\n",
        "\n",
        "--B\n",
        "Content-Type: text/plain\n",
        "\n",
        "hi\n",
        "--B\n",
        "Content-Type: application/octet-stream; name=\"a.bin\"\n",
        "Content-Transfer-Encoding: base64\n",
        "\n",
        "aGVsbG8=\n",
        "--B--\n"
    );
    let (_, sink) = run(msg.as_bytes());

    assert_eq!(sink.attachments().len(), 2);
    assert_eq!(sink.find("textfile0").unwrap().bytes, b"hi\n");
    assert_eq!(sink.find("a.bin").unwrap().bytes, b"hello");
}

/// 3. Nested `message/rfc822`: the inner attachment surfaces at
/// recursion depth 2, and the outer subject is preserved.
#[test]
fn nested_message_rfc822_recurses_and_preserves_outer_subject() {
    let inner = concat!(
        "Content-Type: application/octet-stream\n",
        "Content-Disposition: attachment; filename=\"inner.txt\"\n",
        "\n",
        "inner payload\n"
    );
    let msg = format!(
        concat!(
            "Subject: outer subject\n",
            "Content-Type: multipart/mixed; boundary=\"B\"\n",
            "\n",
            "--B\n",
            "Content-Type: message/rfc822\n",
            "\n",
            "{inner}",
            "--B--\n"
        ),
        inner = inner
    );
    let (record, sink) = run(msg.as_bytes());

    assert!(sink.find("inner.txt").is_some());
    assert_eq!(sink.find("inner.txt").unwrap().bytes, b"inner payload\n");
    assert_eq!(record.subject.as_deref(), Some("outer subject"));
}

/// 4. A uuencoded frame embedded inside a 7bit text body: both the text
/// body and the decoded uuencoded payload are emitted.
#[test]
fn uuencoded_frame_inside_text_body_is_extracted() {
    // "cat" encoded as a uuencode data line: length byte 3, then the
    // base64-adjacent quadruple for the three bytes 'c','a','t'.
    let msg = concat!(
        "Content-Type: text/plain\n",
        "Content-Transfer-Encoding: 7bit\n",
        "\n",
        "see attached\n",
        "begin 644 pic.gif\n",
        "#8V%T\n",
        "`\n",
        "end\n"
    );
    let (_, sink) = run(msg.as_bytes());

    assert!(sink.find("pic.gif").is_some());
    assert_eq!(sink.find("pic.gif").unwrap().bytes, b"cat");
    assert!(sink.find("textfile0").is_some());
}

/// 5. CFBF with an embedded OLE10Native payload: the CFBF container is
/// materialized (as the declared attachment name) and its embedded file
/// is extracted as a sibling attachment with byte-exact contents.
#[test]
fn cfbf_with_ole10native_extracts_the_embedded_file() {
    let cfbf = build_cfbf_with_ole10native();
    let mut msg = Vec::new();
    msg.extend_from_slice(
        concat!(
            "Content-Type: application/octet-stream; name=\"winmail.dat\"\n",
            "Content-Transfer-Encoding: base64\n",
            "\n"
        )
        .as_bytes(),
    );
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&cfbf);
    for chunk in encoded.as_bytes().chunks(76) {
        msg.extend_from_slice(chunk);
        msg.push(b'\n');
    }

    let (_, sink) = run(&msg);

    assert!(sink.find("winmail.dat").is_some());
    assert_eq!(sink.find("report.pdf").unwrap().bytes, b"PDFDATA");
}

/// 6. Boundary forgery: a terminator fires before the first separator
/// ever opened. The multipart collapses to empty, the message completes
/// rather than hanging or erroring, and a `boundary_crash` is registered.
#[test]
fn boundary_forgery_collapses_to_empty_multipart() {
    let msg = concat!("Content-Type: multipart/mixed; boundary=\"X\"\n", "\n", "--X--\n");
    let (record, sink) = run(msg.as_bytes());

    assert!(sink.attachments().is_empty());
    assert_eq!(
        record.errors.count(mailrip_types::ErrorKind::BoundaryCrash),
        1
    );
}

/// Build a minimal single-FAT-sector CFBF container containing one
/// `\x01Ole10Native` stream wrapping a small "Package"-style payload,
/// matching a real CFBF/OLE10Native attachment's shape but sized for an inline test.
fn build_cfbf_with_ole10native() -> Vec<u8> {
    use mailrip_types::cfbf::{HEADER_LEN, SIGNATURE_CFBF};

    let sector_size = 512usize;
    let native_payload = {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 2]);
        buf.extend_from_slice(b"report.pdf");
        buf.push(0);
        buf.extend_from_slice(b"C:\\tmp\\report.pdf");
        buf.push(0);
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(b"C:\\tmp\\report.pdf");
        buf.push(0);
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(b"PDFDATA");
        buf
    };

    let mut file = vec![0u8; HEADER_LEN];
    file[..8].copy_from_slice(&SIGNATURE_CFBF);
    file[0x1e..0x20].copy_from_slice(&9u16.to_le_bytes());
    file[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
    file[0x2c..0x30].copy_from_slice(&1u32.to_le_bytes());
    file[0x30..0x34].copy_from_slice(&1i32.to_le_bytes());
    file[0x38..0x3c].copy_from_slice(&0u32.to_le_bytes());
    file[0x3c..0x40].copy_from_slice(&(-2i32).to_le_bytes());
    file[0x40..0x44].copy_from_slice(&0u32.to_le_bytes());
    file[0x44..0x48].copy_from_slice(&(-2i32).to_le_bytes());
    file[0x48..0x4c].copy_from_slice(&0u32.to_le_bytes());
    file[0x4c..0x50].copy_from_slice(&0i32.to_le_bytes());

    let mut sector0 = vec![0u8; sector_size];
    sector0[0..4].copy_from_slice(&(-3i32).to_le_bytes());
    sector0[4..8].copy_from_slice(&(-2i32).to_le_bytes());
    sector0[8..12].copy_from_slice(&(-2i32).to_le_bytes());

    let mut sector1 = vec![0u8; sector_size];
    write_entry(&mut sector1[0..128], "Root Entry", 5, 1, -1, 0);
    write_entry(&mut sector1[128..256], "\u{1}Ole10Native", 2, 1, 2, native_payload.len() as u32);

    let mut sector2 = vec![0u8; sector_size];
    sector2[..native_payload.len()].copy_from_slice(&native_payload);

    file.extend_from_slice(&sector0);
    file.extend_from_slice(&sector1);
    file.extend_from_slice(&sector2);
    file
}

fn write_entry(buf: &mut [u8], name: &str, entry_type: u8, colour: u8, start_sector: i32, size: u32) {
    let utf16: Vec<u16> = name.encode_utf16().collect();
    for (i, unit) in utf16.iter().enumerate() {
        buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    let byte_count = ((utf16.len() + 1) * 2) as u16;
    buf[0x40..0x42].copy_from_slice(&byte_count.to_le_bytes());
    buf[0x42] = entry_type;
    buf[0x43] = colour;
    buf[0x44..0x48].copy_from_slice(&(-1i32).to_le_bytes());
    buf[0x48..0x4c].copy_from_slice(&(-1i32).to_le_bytes());
    buf[0x4c..0x50].copy_from_slice(&(-1i32).to_le_bytes());
    buf[0x74..0x78].copy_from_slice(&start_sector.to_le_bytes());
    buf[0x78..0x7c].copy_from_slice(&size.to_le_bytes());
}
