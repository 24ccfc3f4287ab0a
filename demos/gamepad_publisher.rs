// Keyboard teleop standing in for a gamepad
//
// WASD = left stick, IJKL = right stick, M = mode toggle, Q = quit.
// Publishes a GamepadState at ~50Hz; sticks recentre shortly after the key is released.
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use quadruped_control::config::TOPIC_CMD_GAMEPAD;
use quadruped_control::messages::GamepadState;

const AXIS_COUNT: usize = 6;
const BUTTON_COUNT: usize = 4;
const BUTTON_MODE: usize = 1;
const HOLD_TIMEOUT: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_GAMEPAD).await?;

    info!("Controls: WASD=left stick, IJKL=right stick, M=mode, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

/// Axis index and raw value driven by a key
fn key_axis(code: KeyCode) -> Option<(usize, f32)> {
    match code {
        KeyCode::Char('a') => Some((0, -1.0)),
        KeyCode::Char('d') => Some((0, 1.0)),
        // Raw stick y reads negative when pushed up
        KeyCode::Char('w') => Some((1, -1.0)),
        KeyCode::Char('s') => Some((1, 1.0)),
        KeyCode::Char('j') => Some((3, 1.0)),
        KeyCode::Char('l') => Some((3, -1.0)),
        KeyCode::Char('i') => Some((4, -1.0)),
        KeyCode::Char('k') => Some((4, 1.0)),
        _ => None,
    }
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut state = GamepadState {
        axes: vec![0.0; AXIS_COUNT],
        buttons: vec![false; BUTTON_COUNT],
    };
    let mut held_at = [None::<Instant>; AXIS_COUNT];

    loop {
        // Button presses last one message so the runtime sees a single edge
        state.buttons[BUTTON_MODE] = false;

        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,
                    KeyCode::Char('m') if kind == KeyEventKind::Press => {
                        state.buttons[BUTTON_MODE] = true;
                        info!("Mode toggle");
                    }
                    _ if pressed => {
                        if let Some((axis, value)) = key_axis(code) {
                            state.axes[axis] = value;
                            held_at[axis] = Some(Instant::now());
                        }
                    }
                    _ => {}
                }
            }
        }

        for (axis, held) in held_at.iter_mut().enumerate() {
            if held.is_some_and(|at| at.elapsed() > HOLD_TIMEOUT) {
                state.axes[axis] = 0.0;
                *held = None;
            }
        }

        publisher.put(serde_json::to_string(&state)?).await?;
    }

    Ok(())
}
