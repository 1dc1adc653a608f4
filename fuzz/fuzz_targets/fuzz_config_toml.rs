#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Parsing and conversion must fail cleanly, never panic
        if let Ok(config) = toml::from_str::<treesync::Config>(content) {
            let _ = config.to_sync_configuration();
        }
    }
});
