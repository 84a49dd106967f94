const USAGE: &str = "usage: cartboy <rom image> [--save <file>] [--device <path>] \
                     [--gb | --gba] [--flash] [--trace] [--no-diagnostics]";

fn main() {
    env_logger::init();

    let options = match cartboy::parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            std::process::exit(1);
        }
    };

    if let Err(error) = cartboy::run(options) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
