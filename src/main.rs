fn main() {
    if let Err(err) = cafe_sales_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
