#[actix_web::main]
async fn main() -> std::io::Result<()> {
    office_pdf_server::run().await
}
