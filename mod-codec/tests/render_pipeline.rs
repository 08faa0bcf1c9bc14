//! End-to-end rendering through the codec

mod common;

use std::io::{Cursor, Seek, SeekFrom, Write};

use mod_codec::{AudioFormat, CodecConfig, CodecError, ModCodec, OutputFormatSpec};
use mod_engine::{Engine, MixerMode, MixerSettings, PlaybackFlags, SliceReader};

use common::{FIXTURE_FRAMES, FIXTURE_TITLE, init_logging, two_second_xm};

const BLOCK: usize = 4096;

fn spec(format: AudioFormat, channels: u8) -> OutputFormatSpec {
    OutputFormatSpec {
        format,
        channels,
        frequency: 44_100,
    }
}

#[test]
fn test_six_channel_blocks_duplicate_stereo() {
    init_logging();
    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 6), &CodecConfig::default()).unwrap();
    let song = codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    codec.play(song).unwrap();

    let mut blocks = 0;
    let mut saw_separation = false;
    let mut buf = vec![0u8; BLOCK];
    while codec.is_playing(song) {
        assert_eq!(codec.render_block(song, &mut buf).unwrap(), BLOCK);
        blocks += 1;
        assert!(blocks < 400, "fixture never ended");

        let frames = buf.chunks_exact(12);
        assert_eq!(frames.remainder(), &[0, 0, 0, 0]);
        for frame in frames {
            assert_eq!(frame[4..8], frame[0..4]);
            assert_eq!(frame[8..12], frame[0..4]);
            saw_separation |= frame[0..2] != frame[2..4];
        }
    }

    // 341 frames per block
    let expected = FIXTURE_FRAMES.div_ceil(341) as i32;
    assert!((blocks - expected).abs() <= 3, "{} blocks", blocks);
    assert!(saw_separation, "left and right voices should differ");
}

#[test]
fn test_mono_output_matches_engine() {
    let config = CodecConfig::default();
    let mut codec = ModCodec::new(&spec(AudioFormat::S16_SYS, 1), &config).unwrap();
    let song = codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    codec.play(song).unwrap();

    let data = two_second_xm();
    let mut engine = Engine::new();
    engine.register_driver(mod_engine::Driver::NoSound);
    engine.register_all_loaders();
    engine
        .init(MixerSettings {
            mode: MixerMode::SIXTEEN_BITS | MixerMode::INTERPOLATE,
            frequency: 44_100,
            volume: config.mixer.volume,
            music_volume: config.mixer.music_volume,
            pan_separation: config.mixer.pan_separation,
        })
        .unwrap();
    let mut raw = engine.load(&mut SliceReader::new(&data), 64).unwrap();
    raw.flags = PlaybackFlags {
        wrap: false,
        repeat_count: 1,
        ..Default::default()
    };
    let raw = std::sync::Arc::new(raw);
    engine.start(&raw);

    let mut expected = vec![0u8; BLOCK];
    let mut actual = vec![0u8; BLOCK];
    for _ in 0..8 {
        engine.write_bytes(&mut expected);
        codec.render_block(song, &mut actual).unwrap();
        assert_eq!(actual, expected);
    }
    assert!(actual.iter().any(|&b| b != 0));
}

#[test]
fn test_signed_8bit_output() {
    let mut codec = ModCodec::new(&spec(AudioFormat::S8, 4), &CodecConfig::default()).unwrap();
    let song = codec.open(&mut Cursor::new(two_second_xm())).unwrap();

    // Not playing: signed silence
    let mut buf = vec![0xFFu8; 1001];
    assert_eq!(codec.render_block(song, &mut buf).unwrap(), 1001);
    assert!(buf.iter().all(|&b| b == 0));

    codec.play(song).unwrap();
    codec.render_block(song, &mut buf).unwrap();
    for frame in buf.chunks_exact(4) {
        assert_eq!(frame[2..4], frame[0..2]);
    }
    assert_eq!(buf[1000], 0, "partial frame is signed silence");
    assert!(buf.iter().any(|&b| b != 0));
}

#[test]
fn test_garbage_fails_to_load() {
    init_logging();
    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 2), &CodecConfig::default()).unwrap();

    let err = codec.open(&mut Cursor::new(vec![0u8; 4096])).unwrap_err();
    match err {
        CodecError::Load(msg) => assert_eq!(msg, "Unrecognized module format"),
        other => panic!("expected load error, got {:?}", other),
    }
    assert_eq!(codec.loaded_count(), 0);
    assert!(codec.last_error().is_some_and(|e| !e.is_empty()));
}

#[test]
fn test_truncated_module_fails_to_load() {
    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 2), &CodecConfig::default()).unwrap();
    let mut data = two_second_xm();
    data.truncate(400);

    assert!(matches!(
        codec.open(&mut Cursor::new(data)),
        Err(CodecError::Load(_))
    ));
    assert_eq!(codec.loaded_count(), 0);
}

#[test]
fn test_module_inside_container() {
    let mut container = Cursor::new(Vec::new());
    container.write_all(&[0xAB; 100]).unwrap();
    container.write_all(&two_second_xm()).unwrap();
    container.write_all(&[0xCD; 10]).unwrap();
    container.seek(SeekFrom::Start(100)).unwrap();

    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 2), &CodecConfig::default()).unwrap();
    let song = codec.open(&mut container).unwrap();
    assert_eq!(codec.title(song).unwrap(), FIXTURE_TITLE);
}

#[test]
fn test_open_owned_source() {
    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 2), &CodecConfig::default()).unwrap();
    let song = codec.open_owned(Cursor::new(two_second_xm())).unwrap();
    codec.play(song).unwrap();
    assert!(codec.is_playing(song));
}

#[test]
fn test_seek_to_time_shortens_playback() {
    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 2), &CodecConfig::default()).unwrap();
    let song = codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    codec.play(song).unwrap();
    codec.seek_to_time(song, 1.0).unwrap();

    // 44100 frames remain, 1024 frames per block
    let mut blocks = 0;
    let mut buf = vec![0u8; BLOCK];
    while codec.is_playing(song) {
        codec.render_block(song, &mut buf).unwrap();
        blocks += 1;
        assert!(blocks < 200);
    }
    assert!((42..=46).contains(&blocks), "{} blocks", blocks);
}

#[test]
fn test_close_while_playing_releases_player() {
    let mut codec = ModCodec::new(&spec(AudioFormat::S16Lsb, 2), &CodecConfig::default()).unwrap();
    let song = codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    codec.play(song).unwrap();
    assert!(codec.player_active());

    codec.close(song).unwrap();
    assert!(!codec.player_active());
    assert!(matches!(
        codec.render_block(song, &mut [0u8; 16]),
        Err(CodecError::UnknownHandle(_))
    ));
}
