//! Startup banner and farewell.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub mode: &'a str,
    pub endpoint: &'a str,
    pub prompt_body: &'a str,
    pub config: &'a str,
}

pub fn banner_text(info: &BannerInfo) -> String {
    format!(
        r#"
   ╔═══════════════════════════════════════╗
   ║              A U G U R                ║
   ║      reads the shape of a workflow    ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   mode      {}
   endpoint  {}
   prompt    {}
   config    {}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.mode,
        info.endpoint,
        info.prompt_body,
        info.config,
    )
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!("{}", banner_text(info));
}

/// Print the session summary and farewell.
pub fn print_session_summary(triggers: usize, failures: usize) {
    if triggers > 0 {
        println!("session: {triggers} request(s), {failures} failed");
    }
    println!("goodbye.");
}
