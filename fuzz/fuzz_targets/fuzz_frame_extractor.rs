//! Fuzz target: both frame extractors.
//!
//! Drives arbitrary byte sequences through the marker and numeric
//! extractors and asserts that they never panic, never yield a frame
//! larger than the frame buffer, and that numeric frames are always
//! exactly six digit-or-dot bytes.
//!
//! cargo fuzz run fuzz_frame_extractor

#![no_main]

use greenhouse::framing::{
    Dialect, Extractor, FrameExtractor, FramingMode, MAX_FRAME_LEN, extract_all,
};
use greenhouse::framing::numeric::NUMERIC_WIDTH;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for mode in [FramingMode::Marker, FramingMode::Numeric] {
        let mut extractor = Extractor::for_mode(mode);
        for frame in extract_all(&mut extractor, data) {
            assert!(frame.as_bytes().len() <= MAX_FRAME_LEN);
            match frame.dialect() {
                Dialect::Marker => {
                    assert_eq!(frame.as_bytes().first(), Some(&b'{'));
                    assert_eq!(frame.as_bytes().last(), Some(&b'}'));
                }
                Dialect::Numeric => {
                    assert_eq!(frame.as_bytes().len(), NUMERIC_WIDTH);
                    assert!(frame.as_bytes().iter().all(|b| b.is_ascii_digit() || *b == b'.'));
                }
            }
            let _ = frame.humidity();
        }

        // After a reset the extractor must accept bytes cleanly again.
        extractor.reset();
        let _ = extract_all(&mut extractor, data);
    }
});
