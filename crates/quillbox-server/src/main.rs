#[tokio::main]
async fn main() {
    quillbox_server::start_server().await;
}
