//! Parser fuzz target: feed arbitrary bytes to the layout parser.
//! The parser must not panic; it should return Ok(layouts) or Err(ConfigError).
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(layouts) = fixedrec::parse_layouts(s) {
        for layout in &layouts {
            assert!(!layout.fields().is_empty());
            assert_eq!(
                layout.record_len(),
                layout.fields().iter().map(|f| f.len()).sum::<usize>()
            );
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
