// Window mixdown: combines the per-producer sample buffers of one
// segment window into a single PCM stream by adding samples together
// with clipping.

/// Mix one window's worth of samples from every producer. Output
/// length is the longest input; shorter inputs contribute silence past
/// their end.
pub(crate) fn mix_windows(windows: &[Vec<i16>]) -> Vec<i16> {
    let max_len = windows.iter().map(|w| w.len()).max().unwrap_or(0);
    let mut mixed = Vec::with_capacity(max_len);

    for i in 0..max_len {
        let mut sum: i32 = 0;
        for window in windows {
            sum += window.get(i).copied().unwrap_or(0) as i32;
        }
        // Clip to prevent overflow
        mixed.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    mixed
}

/// i16 samples to interleaved little-endian bytes.
pub(crate) fn encode_pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
