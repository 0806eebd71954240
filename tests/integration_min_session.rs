// Drives the compiled binary through a PTY, exercising the real event loop
// and crossterm input handling.
//
// - Requires a TTY; expectrl allocates a pseudo terminal.
// - Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::process::Command;
use std::time::Duration;

use expectrl::{Eof, Session};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("typeheat");

    let mut cmd = Command::new(bin);
    cmd.args(["-p", "hi", "--countdown", "0", "-s", "0"])
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME");

    let mut p = Session::spawn(cmd)?;

    // let the app enter the alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // enter starts the session, then the prompt finishes it
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("hi")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("\x1b")?; // ESC
    p.expect(Eof)?;

    assert!(home
        .path()
        .join(".local/state/typeheat/stats.db")
        .exists());
    Ok(())
}
