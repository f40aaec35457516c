use crate::settings::Settings;
use crate::speedtest::{
    download::{DownloadProgress, DownloadTest},
    ping::PingTest,
    transport::Transport,
    upload::estimate_upload,
    SpeedTestResult, TestPhase,
};
use crate::updater::UpdateOutcome;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    MainMenu,
    RunningTest,
    ShowingVersion,
    Updating,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(char),
    Enter,
    Interrupt,
}

impl Input {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Input::Interrupt)
            }
            KeyCode::Char(c) => Some(Input::Key(c)),
            KeyCode::Enter => Some(Input::Enter),
            _ => None,
        }
    }
}

/// Work the event loop has to carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    RunTest,
    RunUpdate,
    InvalidChoice(Option<char>),
    Cancelled,
}

pub fn transition(state: MenuState, input: Input) -> (MenuState, Effect) {
    match (state, input) {
        (MenuState::Exited, _) => (MenuState::Exited, Effect::None),
        (_, Input::Interrupt) => (MenuState::Exited, Effect::Cancelled),
        (MenuState::MainMenu, Input::Key('1')) => (MenuState::RunningTest, Effect::RunTest),
        (MenuState::MainMenu, Input::Key('2')) => (MenuState::ShowingVersion, Effect::None),
        (MenuState::MainMenu, Input::Key('3')) => (MenuState::Updating, Effect::RunUpdate),
        (MenuState::MainMenu, Input::Key('4')) => (MenuState::Exited, Effect::None),
        (MenuState::MainMenu, Input::Key(c)) => (MenuState::MainMenu, Effect::InvalidChoice(Some(c))),
        (MenuState::MainMenu, Input::Enter) => (MenuState::MainMenu, Effect::InvalidChoice(None)),
        // Result screens wait for enter before going back to the menu.
        (_, Input::Enter) => (MenuState::MainMenu, Effect::None),
        (state, Input::Key(_)) => (state, Effect::None),
    }
}

pub struct App {
    pub state: MenuState,
    pub phase: TestPhase,
    pub result: SpeedTestResult,
    pub download_progress: Option<DownloadProgress>,
    pub update: Option<UpdateOutcome>,
    pub notice: Option<String>,
    pub settings: Settings,
    cancelled: bool,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: MenuState::MainMenu,
            phase: TestPhase::Idle,
            result: SpeedTestResult::default(),
            download_progress: None,
            update: None,
            notice: None,
            settings,
            cancelled: false,
        }
    }

    pub fn handle_input(&mut self, input: Input) -> Effect {
        let (next, effect) = transition(self.state, input);
        self.state = next;
        self.notice = None;

        match effect {
            Effect::InvalidChoice(Some(c)) => {
                self.notice = Some(format!("Invalid choice '{}'. Pick 1-4.", c));
            }
            Effect::InvalidChoice(None) => {
                self.notice = Some("Invalid choice. Pick 1-4.".to_string());
            }
            Effect::Cancelled => self.cancelled = true,
            Effect::RunTest => self.reset_for_new_test(),
            Effect::RunUpdate => self.update = None,
            Effect::None => {}
        }

        effect
    }

    pub fn reset_for_new_test(&mut self) {
        self.phase = TestPhase::Ping;
        self.result = SpeedTestResult::default();
        self.download_progress = None;
    }

    pub fn apply_update(&mut self, update: TestUpdate) {
        match update {
            TestUpdate::PingComplete { median_ms } => {
                self.result.ping_ms = median_ms;
                self.phase = TestPhase::Download;
            }
            TestUpdate::DownloadProgress(progress) => self.download_progress = Some(progress),
            TestUpdate::DownloadComplete { speed_mbps } => {
                self.result.download_mbps = speed_mbps;
                self.phase = TestPhase::Upload;
            }
            TestUpdate::UploadComplete { speed_mbps } => {
                self.result.upload_mbps = speed_mbps;
            }
        }
    }

    pub fn complete_test(&mut self, result: SpeedTestResult) {
        self.result = result;
        self.phase = TestPhase::Complete;
    }

    pub fn finish_update(&mut self, outcome: UpdateOutcome) {
        self.update = Some(outcome);
    }

    pub fn should_quit(&self) -> bool {
        self.state == MenuState::Exited
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.cancelled {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

pub enum TestUpdate {
    PingComplete { median_ms: Option<f64> },
    DownloadProgress(DownloadProgress),
    DownloadComplete { speed_mbps: f64 },
    UploadComplete { speed_mbps: f64 },
}

/// Runs ping, download and the upload estimate one after another, reporting
/// each step on `update_tx`. A closed receiver is ignored.
pub async fn run_speed_test<T: Transport + ?Sized>(
    transport: &T,
    settings: &Settings,
    update_tx: mpsc::UnboundedSender<TestUpdate>,
) -> SpeedTestResult {
    let ping = PingTest::new(settings).run(transport).await;
    info!(median_ms = ?ping.median_ms, samples = ?ping.samples, "ping complete");
    let _ = update_tx.send(TestUpdate::PingComplete {
        median_ms: ping.median_ms,
    });

    let download = DownloadTest::new(settings)
        .run(transport, |progress| {
            let _ = update_tx.send(TestUpdate::DownloadProgress(progress));
        })
        .await;
    info!(speed_mbps = download.speed_mbps, "download complete");
    let _ = update_tx.send(TestUpdate::DownloadComplete {
        speed_mbps: download.speed_mbps,
    });

    let upload_mbps = estimate_upload(download.speed_mbps, settings.upload_ratio);
    let _ = update_tx.send(TestUpdate::UploadComplete {
        speed_mbps: upload_mbps,
    });

    SpeedTestResult {
        ping_ms: ping.median_ms,
        download_mbps: download.speed_mbps,
        upload_mbps,
    }
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speedtest::fake::{FakeDownload, FakePing, FakeTransport};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_menu_choices() {
        let menu = MenuState::MainMenu;
        assert_eq!(transition(menu, Input::Key('1')), (MenuState::RunningTest, Effect::RunTest));
        assert_eq!(transition(menu, Input::Key('2')), (MenuState::ShowingVersion, Effect::None));
        assert_eq!(transition(menu, Input::Key('3')), (MenuState::Updating, Effect::RunUpdate));
        assert_eq!(transition(menu, Input::Key('4')), (MenuState::Exited, Effect::None));
        assert_eq!(
            transition(menu, Input::Key('x')),
            (MenuState::MainMenu, Effect::InvalidChoice(Some('x')))
        );
        assert_eq!(
            transition(menu, Input::Enter),
            (MenuState::MainMenu, Effect::InvalidChoice(None))
        );
    }

    #[test]
    fn test_result_screens_return_to_menu_on_enter() {
        for state in [MenuState::RunningTest, MenuState::ShowingVersion, MenuState::Updating] {
            assert_eq!(transition(state, Input::Key('1')), (state, Effect::None));
            assert_eq!(transition(state, Input::Enter), (MenuState::MainMenu, Effect::None));
        }
    }

    #[test]
    fn test_exited_is_terminal() {
        assert_eq!(transition(MenuState::Exited, Input::Key('1')), (MenuState::Exited, Effect::None));
        assert_eq!(transition(MenuState::Exited, Input::Interrupt), (MenuState::Exited, Effect::None));
    }

    #[test]
    fn test_interrupt_exits_with_failure() {
        let mut app = App::new(Settings::default());
        assert_eq!(app.handle_input(Input::Interrupt), Effect::Cancelled);
        assert!(app.should_quit());
        assert!(app.was_cancelled());
    }

    #[test]
    fn test_invalid_choice_sets_notice_until_next_input() {
        let mut app = App::new(Settings::default());
        app.handle_input(Input::Key('9'));
        assert_eq!(app.state, MenuState::MainMenu);
        assert!(app.notice.as_deref().unwrap().contains("'9'"));

        app.handle_input(Input::Key('2'));
        assert_eq!(app.notice, None);
        assert_eq!(app.state, MenuState::ShowingVersion);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(
            Input::from_key(press(KeyCode::Char('1'), KeyModifiers::NONE)),
            Some(Input::Key('1'))
        );
        assert_eq!(
            Input::from_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Input::Interrupt)
        );
        assert_eq!(Input::from_key(press(KeyCode::Enter, KeyModifiers::NONE)), Some(Input::Enter));
        assert_eq!(Input::from_key(press(KeyCode::Tab, KeyModifiers::NONE)), None);
    }

    fn settings_for(urls: &[&str]) -> Settings {
        Settings {
            download_urls: urls.iter().map(|url| url.to_string()).collect(),
            ..Settings::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_reports_median_download_and_estimate() {
        let transport = FakeTransport::new()
            .with_pings(vec![
                FakePing::Reply(Duration::from_millis(20)),
                FakePing::Reply(Duration::from_millis(35)),
                FakePing::Reply(Duration::from_millis(20)),
            ])
            .with_download("primary", FakeDownload::steady(1, Duration::from_millis(1250), 7_482_573));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = run_speed_test(&transport, &settings_for(&["primary"]), tx).await;

        assert_eq!(result.ping_ms, Some(20.0));
        assert_eq!(result.download_mbps, 45.67);
        assert_eq!(format!("{:.2}", result.upload_mbps), "13.70");

        let mut app = App::new(Settings::default());
        app.handle_input(Input::Key('1'));
        while let Ok(update) = rx.try_recv() {
            app.apply_update(update);
        }
        assert_eq!(app.phase, TestPhase::Upload);
        assert_eq!(app.result, result);
        assert_eq!(app.download_progress.as_ref().unwrap().downloaded_bytes, 7_482_573);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_with_no_reachable_server_reports_zero() {
        let transport = FakeTransport::new().with_pings(vec![
            FakePing::Reply(Duration::from_millis(15)),
            FakePing::Fail,
            FakePing::Reply(Duration::from_millis(30)),
        ]);

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = run_speed_test(&transport, &settings_for(&["a", "b"]), tx).await;

        assert_eq!(result.ping_ms, Some(30.0));
        assert_eq!(result.download_mbps, 0.0);
        assert_eq!(result.upload_mbps, 0.0);
        assert_eq!(transport.opened(), vec!["a", "b"]);
    }
}
