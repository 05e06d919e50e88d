//! Generates forensic fixture files in `test-fixtures/`.
//! Run with: `cargo run -p om-core --example gen_fixtures`

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use om_core::{carve, detect_type};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    let dir = Path::new("test-fixtures");
    fs::create_dir_all(dir).expect("failed to create test-fixtures/");

    gen_disk_image(dir);
    gen_compressed(dir);
    gen_artifact_log(dir);
    gen_comparison_pair(dir);

    println!("All fixtures generated in {}", dir.display());
}

fn fake_jpeg(body_len: usize, rng: &mut StdRng) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    out.extend((0..body_len).map(|_| rng.gen_range(0x00..0xFF)));
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn fake_png() -> Vec<u8> {
    let mut out = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    out.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]);
    out.extend_from_slice(b"IHDR");
    out.extend_from_slice(&[0u8; 17]);
    out.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    out.extend_from_slice(&[0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82]);
    out
}

/// 64 KB "unallocated space": zero fill with a JPEG, a PNG and a PDF at known
/// offsets, plus a stretch of random noise.
fn gen_disk_image(dir: &Path) {
    let mut rng = StdRng::seed_from_u64(0xF0E2_1C5);
    let mut data = vec![0u8; 64 * 1024];

    let jpeg = fake_jpeg(2000, &mut rng);
    data[0x1000..0x1000 + jpeg.len()].copy_from_slice(&jpeg);

    let png = fake_png();
    data[0x4000..0x4000 + png.len()].copy_from_slice(&png);

    let pdf = b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer\n%%EOF\n";
    data[0x6000..0x6000 + pdf.len()].copy_from_slice(pdf);

    rng.fill(&mut data[0x8000..0xC000]);

    let report = carve(&data);
    fs::write(dir.join("disk_image.bin"), &data).expect("failed to write disk_image.bin");
    println!(
        "  disk_image.bin    ({} bytes, {} carvable files)",
        data.len(),
        report.total_found
    );
}

/// Highly compressible text, zlib-compressed: entropy close to 8 bits/byte.
fn gen_compressed(dir: &Path) {
    let text = "the quick brown fox jumps over the lazy dog\n".repeat(2000);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(text.as_bytes())
        .expect("failed to compress");
    let data = encoder.finish().expect("failed to finish compression");

    fs::write(dir.join("compressed.zz"), &data).expect("failed to write compressed.zz");
    println!("  compressed.zz     ({} bytes)", data.len());
}

/// Binary blob with embedded text artifacts for string and pattern extraction.
fn gen_artifact_log(dir: &Path) {
    let artifacts = [
        "GET http://malicious.example/payload.bin HTTP/1.1",
        "exfil to attacker@evil.example",
        "beacon 203.0.113.99:4444",
        "bogus 999.999.999.999",
        r"C:\Users\victim\AppData\Roaming\dropper.exe",
        "card 4111-1111-1111-1111",
        "call 555.867.5309",
    ];

    let mut data = vec![0x7F, 0x45, 0x4C, 0x46, 0x02, 0x01, 0x01, 0x00];
    for artifact in artifacts {
        data.extend_from_slice(&[0x00, 0x01, 0xFE]);
        data.extend_from_slice(artifact.as_bytes());
    }
    data.push(0x00);

    fs::write(dir.join("artifacts.bin"), &data).expect("failed to write artifacts.bin");
    println!(
        "  artifacts.bin     ({} bytes, {})",
        data.len(),
        detect_type(&data)
    );
}

/// Two 4 KB files: the second has 3 flipped bytes and 16 appended bytes.
fn gen_comparison_pair(dir: &Path) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut original = vec![0u8; 4096];
    rng.fill(&mut original[..]);

    let mut modified = original.clone();
    for offset in [0x10, 0x800, 0xFFF] {
        modified[offset] ^= 0xFF;
    }
    modified.extend_from_slice(&[0xAA; 16]);

    fs::write(dir.join("original.bin"), &original).expect("failed to write original.bin");
    fs::write(dir.join("modified.bin"), &modified).expect("failed to write modified.bin");
    println!("  original.bin / modified.bin (4096 / 4112 bytes)");
}
