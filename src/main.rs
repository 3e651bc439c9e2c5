#[actix_web::main]
async fn main() -> std::io::Result<()> {
    csv_curator_lib::run().await
}
