fn main() -> Result<(), Box<dyn std::error::Error>> {
    slnscope_cli::run()
}
