use portal_admin::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run(cli::command().get_matches()).await
}
