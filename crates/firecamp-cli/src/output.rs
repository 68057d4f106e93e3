use serde::Serialize;

/// Pretty-print any serializable value as JSON. Used for any command output
/// that has no richer text rendering.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to render output: {e}"),
    }
}
