use gcode2as::parser::{parse_line, CommandStream};

fn main() {
    println!("=== Parser Demo ===");

    let test_lines = [
        "G1 X10 Y20.5 Z0.2 E1.5 ; linear move",
        "G1X5Y5E2",
        "M3 S80 ; beam on",
        "(this is a comment)",
        "",
        "G2 X10 Y10 I5 J0 ; arc",
        "G1 X1..2",
    ];

    for line in test_lines {
        println!("\nInput: '{}'", line);
        match parse_line(line) {
            Ok(Some(command)) => println!("Parsed: {:?} {:?}", command.kind, command.words),
            Ok(None) => println!("Parsed: blank"),
            Err(err) => println!("Error: {}", err),
        }
    }

    println!("\n=== Modal motion ===");
    for command in CommandStream::from_text("G1 X0 Y0 F1200\nX10 E1\nY10 E2\n").flatten() {
        println!("line {}: {:?} -> {:?}", command.line, command.kind, command.words);
    }
}
