#![no_main]
use libfuzzer_sys::fuzz_target;
use replaycov::parsers::summary::SummaryParser;
use replaycov::parsers::switch::SwitchParser;
use replaycov::parsers::ReportParser;

fuzz_target!(|data: &[u8]| {
    // Summary and switch readers must not panic on any input.
    let _ = SummaryParser.parse(data);
    let _ = SwitchParser.parse(data);
});
