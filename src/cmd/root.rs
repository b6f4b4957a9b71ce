use crate::calc::dates::today;
use crate::cmd::Session;
use crate::ui::calendar_view::{App, run_app};
use crate::ui::{ViewController, restore_terminal, setup_terminal};
use anyhow::Result;
use tokio::runtime::Runtime;
use tracing::info;

pub fn run(session: &Session, runtime: &Runtime) -> Result<()> {
    let entry_id = runtime.block_on(session.entry_id())?;
    let controller = ViewController::new(session.service(), entry_id);

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen);
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(controller, session.settings.clone(), runtime.handle().clone(), today());

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    info!(entry = %app.controller().entry_id(), "terminal ui closed");
    result
}
