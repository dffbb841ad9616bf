//! Example of encoding a file, faking a compiler pass and decoding it again

use emx_whitespace::{Decoder, Encoder, Options};

fn main() -> anyhow::Result<()> {
    println!("=== Whitespace Round Trip ===\n");

    let source = "\
interface Point {
    x  : number;
    y  : number;
}

function len(p  : Point, scale) {
    if (scale) {
        return 2;
    }else {
        return 1;
    }
}
";

    let encoder = Encoder::new(Options::default());
    let encoded = encoder.encode(source);

    println!("Encoded:");
    println!("---");
    println!("{}", encoded);
    println!("---");

    // A TypeScript compiler drops the interface and the annotations, and
    // moves `else` to its own line.
    let compiled = encoded
        .replace("interface Point {\n    x /*C2*/: number;\n    y /*C2*/: number;\n}\n", "")
        .replace(": Point", "")
        .replace("*/else", "*/\n    else");

    let decoded = Decoder::new().decode(&compiled)?;

    println!("\nDecoded:");
    println!("---");
    println!("{}", decoded);
    println!("---");

    Ok(())
}
