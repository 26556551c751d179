use approx::assert_abs_diff_eq;
use image::{
    DynamicImage,
    Rgb,
    RgbImage,
};
use sstvenc::{
    EncodeJob,
    GetSampleRate,
    modem::sstv::{
        ModeSpecification,
        SYNC_TONE,
        Tone,
        describe,
        encode,
        frequency_for_intensity,
        modes::BUILTIN_MODES,
    },
    sink::{
        AudioFormat,
        Transcoder,
        export,
        output_path,
        read_wav,
    },
    source::render,
};

fn mid_gray(mode: &ModeSpecification) -> RgbImage {
    RgbImage::from_pixel(
        mode.pixels_per_line as u32,
        mode.num_lines as u32,
        Rgb([128, 128, 128]),
    )
}

#[test]
fn scottie_mid_gray() {
    let mode = describe("Scottie 1").unwrap();
    let image = mid_gray(mode);

    let tones = encode(&image, mode).unwrap();
    let scan_time = mode.pixel_time(0);
    let scans = tones
        .iter()
        .filter(|tone| tone.duration == scan_time)
        .collect::<Vec<_>>();
    assert_eq!(scans.len(), 3 * 320 * 256);
    let expected = frequency_for_intensity(128.0);
    assert!(scans.iter().all(|tone| tone.frequency == expected));

    let output = EncodeJob::new(mode)
        .with_sample_rate(44100.0)
        .run(&DynamicImage::ImageRgb8(image))
        .unwrap();
    assert_eq!(
        output.pcm.len(),
        (mode.frame_time() * 44100.0).round() as usize
    );
    assert_eq!(output.stats.num_tones, tones.len());
}

#[test]
fn rendered_duration_matches_frame_time() {
    for mode in BUILTIN_MODES {
        let tones = encode(&mid_gray(mode), mode).unwrap();
        for sample_rate in [22050.0f32, 44100.0, 48000.0] {
            let pcm = render(tones.iter().copied(), sample_rate).unwrap();
            assert_eq!(pcm.sample_rate(), sample_rate);
            assert_abs_diff_eq!(
                pcm.duration(),
                mode.frame_time(),
                epsilon = 1.0 / sample_rate as f64
            );
        }
    }
}

#[test]
fn scottie_starts_with_sync_after_header() {
    let mode = &ModeSpecification::S1;
    let tones = encode(&mid_gray(mode), mode).unwrap();
    assert_eq!(tones[13], Tone::new(SYNC_TONE, mode.sync_time));
}

#[test]
fn wav_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mode = describe("m2").unwrap();
    let output = EncodeJob::new(mode)
        .with_sample_rate(22050.0)
        .run(&DynamicImage::ImageRgb8(mid_gray(mode)))
        .unwrap();

    let path = output_path(dir.path().join("gray"), AudioFormat::Wav);
    let written = export(&output.pcm, AudioFormat::Wav, &path, &Transcoder::default()).unwrap();
    assert_eq!(written, path);

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.spec().sample_rate, 22050);
    assert_eq!(reader.len() as usize, output.pcm.len());

    let read = read_wav(&path).unwrap();
    assert_eq!(read.samples(), output.pcm.samples());
}
