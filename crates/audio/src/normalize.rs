//! Audio normalization to canonical transcription input
//!
//! Accepts any container/codec symphonia can probe (WAV, MP3, AAC, MP4)
//! and produces mono 16-bit PCM WAV at 16 kHz.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use nyaya_core::{Error, Result};

/// Target sample rate for transcription input
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decode arbitrary audio bytes and re-encode as mono 16-bit 16 kHz WAV
pub fn normalize_to_wav(data: &[u8]) -> Result<Vec<u8>> {
    let samples = decode_to_mono_f32(data)?;
    encode_wav(&samples)
}

/// Decode to interleaved f32, downmixed to mono and resampled to 16 kHz
fn decode_to_mono_f32(data: &[u8]) -> Result<Vec<f32>> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let hint = Hint::new();
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Conversion(format!("probe: {e}")))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Conversion("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Conversion("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Conversion(format!("codec: {e}")))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::Conversion(format!("packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = %e, "skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(Error::Conversion(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let samples = sample_buf.samples();

        if channels > 1 {
            for frame in samples.chunks(channels) {
                let mono: f32 = frame.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        } else {
            all_samples.extend_from_slice(samples);
        }
    }

    if all_samples.is_empty() {
        return Err(Error::Conversion("no audio samples decoded".to_string()));
    }

    if source_rate != TARGET_SAMPLE_RATE {
        all_samples = resample(&all_samples, source_rate, TARGET_SAMPLE_RATE)?;
    }

    tracing::debug!(
        samples = all_samples.len(),
        duration_secs = all_samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
        "audio normalized to 16 kHz mono PCM"
    );

    Ok(all_samples)
}

/// FFT-based resampling with a linear fallback for very short inputs
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio) as usize;

    const CHUNK_SIZE: usize = 1024;
    if samples.len() < CHUNK_SIZE {
        return Ok(resample_linear(samples, ratio));
    }

    let mut resampler =
        match FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "resampler init failed, using linear fallback");
                return Ok(resample_linear(samples, ratio));
            }
        };

    let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let mut input: Vec<f64> = chunk.iter().map(|&s| s as f64).collect();
        input.resize(CHUNK_SIZE, 0.0);

        let result = resampler
            .process(&[input], None)
            .map_err(|e| Error::Conversion(format!("resample: {e}")))?;

        if let Some(channel) = result.first() {
            output.extend(channel.iter().map(|&s| s as f32));
        }
    }

    output.truncate(expected_len);
    Ok(output)
}

fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx_floor = src_idx.floor() as usize;
        let idx_ceil = (idx_floor + 1).min(samples.len().saturating_sub(1));
        let frac = (src_idx - idx_floor as f64) as f32;

        resampled.push(samples[idx_floor] * (1.0 - frac) + samples[idx_ceil] * frac);
    }

    resampled
}

/// Encode mono f32 samples as 16-bit PCM WAV bytes
fn encode_wav(samples: &[f32]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Conversion(format!("wav writer: {e}")))?;
        for &sample in samples {
            let pcm = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| Error::Conversion(format!("wav write: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Conversion(format!("wav finalize: {e}")))?;
    }

    Ok(cursor.into_inner())
}
