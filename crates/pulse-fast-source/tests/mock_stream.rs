use pulse_fast_source::{Backend, Configuration, MockSceneConfig};
use tokio_stream::StreamExt;

#[tokio::test(flavor = "multi_thread")]
async fn configuration_creates_a_working_mock_provider() {
    let config = Configuration {
        backend: Backend::Mock,
        scene: MockSceneConfig {
            frame_count: 15,
            ..MockSceneConfig::default()
        },
        ..Configuration::default()
    };
    let provider = config.create_provider().expect("mock provider");
    assert_eq!(provider.total_frames(), Some(15));
    assert_eq!(provider.nominal_fps(), Some(30.0));

    let mut stream = provider.into_stream();
    let mut frames = 0usize;
    while let Some(frame) = stream.next().await {
        let frame = frame.expect("frame");
        assert_eq!(frame.frame_index(), Some(frames as u64));
        frames += 1;
    }
    assert_eq!(frames, 15);
}
