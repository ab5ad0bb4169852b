pub mod commands;
pub mod fzf;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    commands::run().await
}
