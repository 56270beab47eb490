#![no_main]
use libfuzzer_sys::fuzz_target;
use replaycov::parsers::gcov::GcovParser;
use replaycov::parsers::ReportParser;

fuzz_target!(|data: &[u8]| {
    // Parser must not panic on any input.
    let _ = GcovParser.parse(data);
});
