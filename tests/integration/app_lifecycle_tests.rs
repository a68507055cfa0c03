/*!
 * Controller workflow tests: files in, artifacts out
 */

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use speechsub::app_config::{Config, EngineProvider};
use speechsub::app_controller::{Controller, RunOutcome};
use speechsub::file_utils::FileManager;
use speechsub::providers::mock::MockEngine;
use speechsub::subtitle_processor::parse_srt_string;
use speechsub::synthesis::SpeechService;
use crate::common;

fn mock_controller(config: Config) -> Controller {
    common::init_test_logging();
    Controller::with_service(SpeechService::with_engine(Box::new(MockEngine::working()), config))
}

#[tokio::test]
async fn test_run_withTextFile_shouldWriteAudioAndSubtitles() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "story.txt", "Hello world. This is a test.").unwrap();
    let output_dir = temp_dir.path().join("out");

    let outcome = mock_controller(common::fast_config())
        .run(input, output_dir.clone(), false)
        .await
        .unwrap();

    let paths = match outcome {
        RunOutcome::Written(paths) => paths,
        RunOutcome::Skipped => panic!("expected outputs to be written"),
    };
    assert_eq!(paths.audio, output_dir.join("story.mp3"));
    assert_eq!(paths.subtitle, output_dir.join("story.srt"));
    assert!(paths.envelope.is_none());

    let audio = std::fs::read(&paths.audio).unwrap();
    assert_eq!(audio, b"[Hello][world.][This][is][a][test.]".to_vec());

    let captions = parse_srt_string(&FileManager::read_to_string(&paths.subtitle).unwrap()).unwrap();
    assert_eq!(captions.len(), 1);
    assert_eq!(captions[0].text, "Hello world. This is a test.");
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "note.txt", "Short note.").unwrap();
    let existing = common::create_test_file(temp_dir.path(), "note.srt", "keep me").unwrap();
    let controller = mock_controller(common::fast_config());

    let outcome = controller.run(input.clone(), temp_dir.path().to_path_buf(), false).await.unwrap();
    assert_eq!(outcome, RunOutcome::Skipped);
    assert_eq!(FileManager::read_to_string(&existing).unwrap(), "keep me");

    let outcome = controller.run(input, temp_dir.path().to_path_buf(), true).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Written(_)));
    assert!(FileManager::read_to_string(&existing).unwrap().starts_with("1\n"));
}

#[tokio::test]
async fn test_run_withJsonEnabled_shouldWriteEnvelope() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "greeting.txt", "Hi").unwrap();
    let mut config = common::fast_config();
    config.output.write_json_envelope = true;

    let outcome = mock_controller(config)
        .run(input, temp_dir.path().to_path_buf(), false)
        .await
        .unwrap();

    let envelope_path = match outcome {
        RunOutcome::Written(paths) => paths.envelope.unwrap(),
        RunOutcome::Skipped => panic!("expected outputs to be written"),
    };
    let json: serde_json::Value =
        serde_json::from_str(&FileManager::read_to_string(&envelope_path).unwrap()).unwrap();

    assert_eq!(json["status"], "success");
    let srt = STANDARD.decode(json["data"]["srt_base64"].as_str().unwrap()).unwrap();
    assert_eq!(String::from_utf8(srt).unwrap(), "1\n00:00:00,000 --> 00:00:00,200\nHi\n\n");
    assert_eq!(json["data"]["metadata"]["voice"], "pt-BR-FranciscaNeural");
    assert_eq!(json["data"]["metadata"]["segments"], 1);
}

#[tokio::test]
async fn test_run_withBlankFile_shouldFailWithoutOutputs() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(temp_dir.path(), "blank.txt", "   \n").unwrap();

    let result = mock_controller(common::fast_config())
        .run(input, temp_dir.path().to_path_buf(), false)
        .await;

    assert!(result.is_err());
    assert!(!temp_dir.path().join("blank.srt").exists());
    assert!(!temp_dir.path().join("blank.mp3").exists());
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let result = mock_controller(common::fast_config())
        .run(temp_dir.path().join("missing.txt"), temp_dir.path().to_path_buf(), false)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_folder_shouldProcessTextFilesAndCountOutcomes() {
    let temp_dir = common::create_temp_dir().unwrap();
    let nested = temp_dir.path().join("part2");
    FileManager::ensure_dir(&nested).unwrap();
    common::create_test_file(temp_dir.path(), "one.txt", "First text.").unwrap();
    common::create_test_file(&nested, "two.txt", "Second text.").unwrap();
    common::create_test_file(temp_dir.path(), "empty.txt", "").unwrap();
    common::create_test_file(temp_dir.path(), "done.txt", "Already done.").unwrap();
    common::create_test_file(temp_dir.path(), "done.srt", "existing").unwrap();
    common::create_test_file(temp_dir.path(), "readme.md", "not speech").unwrap();

    let summary = mock_controller(common::fast_config())
        .run_folder(temp_dir.path().to_path_buf(), false)
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 1);
    assert!(!summary.cancelled);
    assert!(nested.join("two.srt").exists());
    assert!(temp_dir.path().join("speechsub.log").exists());
}

#[tokio::test]
async fn test_run_folder_whenCancelled_shouldStopEarly() {
    let temp_dir = common::create_temp_dir().unwrap();
    common::create_test_file(temp_dir.path(), "a.txt", "Alpha.").unwrap();
    common::create_test_file(temp_dir.path(), "b.txt", "Beta.").unwrap();

    let controller = mock_controller(common::fast_config());
    controller.cancellation_token().cancel();

    let summary = controller.run_folder(temp_dir.path().to_path_buf(), false).await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert!(!temp_dir.path().join("a.srt").exists());
}

#[test]
fn test_run_folder_withoutTextFiles_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    common::create_test_file(temp_dir.path(), "image.png", "binary").unwrap();
    let controller = mock_controller(common::fast_config());

    let result = tokio_test::block_on(async {
        controller.run_folder(temp_dir.path().to_path_buf(), false).await
    });
    assert!(result.is_err());
}

#[test]
fn test_with_config_withMockProvider_shouldBuildController() {
    let mut config = common::fast_config();
    config.engine.provider = EngineProvider::Mock;

    let controller = Controller::with_config(config).unwrap();
    assert_eq!(controller.config().engine.provider, EngineProvider::Mock);
}
