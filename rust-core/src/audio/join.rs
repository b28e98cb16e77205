//! Concatenate WAV files into one

use super::input::AudioError;
use super::resample::resample;
use super::wav::{pcm16_spec, read_wav, remap_channels, write_pcm16};
use hound::WavWriter;
use std::path::{Path, PathBuf};

/// Join `paths` end to end into `output`
///
/// The first file decides the output channel count and sample rate; later
/// files are channel-mapped and resampled to match. Audio is written to a
/// sibling `.part` file that replaces `output` only once it is complete, so a
/// failed join leaves any existing file untouched. An `output` that names one
/// of the inputs is rejected.
///
/// # Returns
/// Output path and total frames written
pub fn join_wav_files<P, Q>(paths: &[P], output: Q) -> Result<(PathBuf, u64), AudioError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let first = paths.first().ok_or(AudioError::NothingToJoin)?;
    let output = output.as_ref().to_path_buf();

    if paths.iter().any(|p| same_file(p.as_ref(), &output)) {
        return Err(AudioError::OutputIsInput(output));
    }

    let head = read_wav(first)?;
    let channels = head.channels.max(1);
    let sample_rate = head.sample_rate;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let partial = partial_path(&output);
    let mut writer = WavWriter::create(&partial, pcm16_spec(channels, sample_rate))?;
    let mut frames = head.frames() as u64;

    let result = (|| -> Result<(), AudioError> {
        write_pcm16(&mut writer, &head.samples)?;

        for path in &paths[1..] {
            let audio = read_wav(path)?;
            let mapped = remap_channels(&audio.samples, audio.channels as usize, channels as usize);
            let converted = resample(&mapped, channels as usize, audio.sample_rate, sample_rate)?;

            log::debug!(
                "Appending {} ({} Hz, {} ch)",
                path.as_ref().display(),
                audio.sample_rate,
                audio.channels
            );
            write_pcm16(&mut writer, &converted)?;
            frames += (converted.len() / channels as usize) as u64;
        }
        Ok(())
    })();

    let result = result
        .and_then(|_| writer.finalize().map_err(AudioError::from))
        .and_then(|_| std::fs::rename(&partial, &output).map_err(AudioError::from));
    if let Err(e) = result {
        log::error!("Join into {} failed: {}", output.display(), e);
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    log::info!(
        "Joined {} file(s) into {} ({} frames)",
        paths.len(),
        output.display(),
        frames
    );
    Ok((output, frames))
}

/// `<dir>/.<name>.part` next to `output`
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "joined.wav".to_string());
    output.with_file_name(format!(".{}.part", name))
}

/// Both paths exist and resolve to the same file
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavSpec;
    use tempfile::tempdir;

    fn write_constant(path: &Path, channels: u16, rate: u32, frames: usize, value: f32) {
        let mut writer = WavWriter::create(path, pcm16_spec(channels, rate)).unwrap();
        write_pcm16(&mut writer, &vec![value; frames * channels as usize]).unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn test_join_in_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_constant(&a, 1, 8000, 100, 0.5);
        write_constant(&b, 1, 8000, 50, -0.5);

        let out = dir.path().join("out").join("joined.wav");
        let (path, frames) = join_wav_files(&[&a, &b], &out).unwrap();
        assert_eq!(path, out);
        assert_eq!(frames, 150);

        let joined = read_wav(&out).unwrap();
        assert_eq!(joined.frames(), 150);
        assert!(joined.samples[..100].iter().all(|&s| s > 0.49));
        assert!(joined.samples[100..].iter().all(|&s| s < -0.49));
    }

    #[test]
    fn test_join_converts_channels_and_rate() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_constant(&a, 2, 16000, 1600, 0.1);
        write_constant(&b, 1, 8000, 800, 0.0);

        let out = dir.path().join("joined.wav");
        let (_, frames) = join_wav_files(&[a, b], &out).unwrap();
        assert_eq!(frames, 3200);

        let joined = read_wav(&out).unwrap();
        assert_eq!(joined.channels, 2);
        assert_eq!(joined.sample_rate, 16000);
        assert_eq!(joined.frames(), 3200);
    }

    #[test]
    fn test_join_nothing() {
        let dir = tempdir().unwrap();
        let paths: Vec<PathBuf> = Vec::new();
        assert!(matches!(
            join_wav_files(&paths, dir.path().join("out.wav")),
            Err(AudioError::NothingToJoin)
        ));
    }

    #[test]
    fn test_join_bad_input_removes_output() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.wav");
        write_constant(&a, 1, 8000, 10, 0.2);
        let missing = dir.path().join("missing.wav");
        let out = dir.path().join("out.wav");

        assert!(join_wav_files(&[a, missing], &out).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_join_refuses_to_overwrite_an_input() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_constant(&a, 1, 8000, 100, 0.5);
        write_constant(&b, 1, 8000, 50, -0.5);

        let err = join_wav_files(&[&a, &b], &b).unwrap_err();
        assert!(matches!(err, AudioError::OutputIsInput(_)));
        assert_eq!(read_wav(&b).unwrap().frames(), 50);

        // Same file through a different spelling
        let dotted = dir.path().join(".").join("a.wav");
        assert!(join_wav_files(&[&a, &b], &dotted).is_err());
        assert_eq!(read_wav(&a).unwrap().frames(), 100);
    }

    #[test]
    fn test_failed_join_keeps_existing_output() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let out = dir.path().join("out.wav");
        write_constant(&a, 1, 8000, 10, 0.2);
        write_constant(&out, 2, 16000, 33, 0.1);

        let missing = dir.path().join("missing.wav");
        assert!(join_wav_files(&[&a, &missing], &out).is_err());

        let kept = read_wav(&out).unwrap();
        assert_eq!(kept.channels, 2);
        assert_eq!(kept.frames(), 33);
        assert!(!partial_path(&out).exists());
    }

    #[test]
    fn test_join_single_float_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&a, spec).unwrap();
        for _ in 0..40 {
            writer.write_sample(0.25_f32).unwrap();
        }
        writer.finalize().unwrap();

        let out = dir.path().join("out.wav");
        let (_, frames) = join_wav_files(&[a], &out).unwrap();
        assert_eq!(frames, 40);
        assert_eq!(read_wav(&out).unwrap().frames(), 40);
    }
}
