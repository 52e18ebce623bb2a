//! Decodes a captured SSE response body from a file.
//!
//! `cargo run -p realai-client --example decode_capture -- capture.sse`
use realai_client::decode::decode_body;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    realai_client::init_observability();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: decode_capture <capture.sse>")?;
    let body = std::fs::read(&path)?;
    let output = decode_body(&body, &mut ());

    println!("{}", output.text);
    for image in &output.images {
        match realai_client::decode::split_embedded_data(image) {
            Some((media_type, payload)) => println!("[{media_type}, {} base64 chars]", payload.len()),
            None => println!("[{image}]"),
        }
    }
    Ok(())
}
