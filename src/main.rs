mod allocator;

use hushbox::app::App;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    App::init()?.execute().await
}
