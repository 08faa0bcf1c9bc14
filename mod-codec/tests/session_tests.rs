//! Multi-module session behavior with real modules

mod common;

use std::io::Cursor;

use mod_codec::{
    AudioCodec, AudioFormat, CodecCapabilities, CodecConfig, CodecError, ModCodec, ModuleHandle,
    OutputFormatSpec, PlayPolicy, PlaybackState,
};

use common::{FIXTURE_TITLE, init_logging, two_second_xm};

fn open_codec(config: &CodecConfig) -> ModCodec {
    init_logging();
    ModCodec::new(&OutputFormatSpec::default(), config).unwrap()
}

fn open_pair(codec: &mut ModCodec) -> (ModuleHandle, ModuleHandle) {
    let first = codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    let second = codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    (first, second)
}

#[test]
fn test_supersede_moves_the_player() {
    let mut codec = open_codec(&CodecConfig::default());
    let (first, second) = open_pair(&mut codec);
    assert_ne!(first, second);
    assert_eq!(codec.loaded_count(), 2);

    codec.play(first).unwrap();
    assert!(codec.is_playing(first));
    assert!(!codec.is_playing(second));

    codec.play(second).unwrap();
    assert!(!codec.is_playing(first));
    assert!(codec.is_playing(second));
    assert_eq!(codec.state(first), Some(PlaybackState::Stopped));
    assert_eq!(codec.state(second), Some(PlaybackState::Playing));

    // Rendering the superseded handle yields silence
    let mut buf = vec![0xAAu8; 512];
    codec.render_block(first, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn test_reject_policy_keeps_the_player() {
    let config = CodecConfig::from_toml_str("[session]\nplay_policy = \"reject\"").unwrap();
    assert_eq!(config.session.play_policy, PlayPolicy::Reject);

    let mut codec = open_codec(&config);
    let (first, second) = open_pair(&mut codec);
    codec.play(first).unwrap();

    let err = codec.play(second).unwrap_err();
    assert!(matches!(err, CodecError::PlayerBusy { active } if active == first));
    assert!(codec.is_playing(first));
    assert_eq!(codec.state(second), Some(PlaybackState::Loaded));

    // Replaying the owner is fine
    codec.play(first).unwrap();

    codec.stop(first).unwrap();
    codec.play(second).unwrap();
    assert!(codec.is_playing(second));
}

#[test]
fn test_stop_of_idle_handle_leaves_player() {
    let mut codec = open_codec(&CodecConfig::default());
    let (first, second) = open_pair(&mut codec);
    codec.play(first).unwrap();

    codec.stop(second).unwrap();
    assert!(codec.is_playing(first));
    assert!(codec.player_active());
}

#[test]
fn test_closed_handle_is_unknown() {
    let mut codec = open_codec(&CodecConfig::default());
    let (first, second) = open_pair(&mut codec);
    codec.close(first).unwrap();

    assert_eq!(codec.loaded_count(), 1);
    assert!(matches!(codec.play(first), Err(CodecError::UnknownHandle(h)) if h == first));
    assert!(matches!(codec.close(first), Err(CodecError::UnknownHandle(_))));
    assert_eq!(codec.state(first), None);
    assert_eq!(codec.title(second).unwrap(), FIXTURE_TITLE);
}

#[test]
fn test_host_contract_through_trait_object() {
    let mut codec = open_codec(&CodecConfig::default());
    let host: &mut dyn AudioCodec = &mut codec;

    let caps = host.capabilities();
    assert!(caps.contains(CodecCapabilities::NEED_VOLUME_INIT_POST));
    assert!(caps.contains(CodecCapabilities::SINGLETON));

    let song = host.open(&mut Cursor::new(two_second_xm())).unwrap();
    host.set_volume(song, 128).unwrap();
    host.play(song).unwrap();
    assert!(host.is_playing(song));

    host.pause(song).unwrap();
    host.resume(song).unwrap();
    host.set_loops(song, -1).unwrap();
    assert!(!host.is_paused(song));
    assert!(host.is_playing(song));
    assert_eq!(host.current_time(song), None);

    assert_eq!(host.title(song).unwrap(), FIXTURE_TITLE);
    assert_eq!(host.artist(song).unwrap(), "");
    assert_eq!(host.album(song).unwrap(), "");
    assert_eq!(host.copyright(song).unwrap(), "");

    let mut buf = vec![0u8; 1024];
    assert_eq!(host.render_block(song, &mut buf).unwrap(), 1024);
    host.seek_to_time(song, 0.5).unwrap();
    host.stop(song).unwrap();
    assert!(!host.is_playing(song));
    host.close(song).unwrap();
}

#[test]
fn test_failed_open_sets_last_error() {
    let mut codec = open_codec(&CodecConfig::default());
    assert_eq!(codec.last_error(), None);

    assert!(codec.open(&mut Cursor::new(b"not a module".to_vec())).is_err());
    let message = codec.last_error().map(str::to_owned);
    assert!(message.is_some());

    // A later success does not clear the record
    codec.open(&mut Cursor::new(two_second_xm())).unwrap();
    assert_eq!(codec.last_error().map(str::to_owned), message);
}

#[test]
fn test_unsupported_output_format() {
    let spec = OutputFormatSpec {
        format: AudioFormat::F32Lsb,
        ..Default::default()
    };
    assert!(matches!(
        ModCodec::new(&spec, &CodecConfig::default()),
        Err(CodecError::UnsupportedFormat(AudioFormat::F32Lsb))
    ));

    let spec = OutputFormatSpec {
        channels: 8,
        ..Default::default()
    };
    assert!(matches!(
        ModCodec::new(&spec, &CodecConfig::default()),
        Err(CodecError::TooManyChannels { requested: 8, max: 6 })
    ));
}
