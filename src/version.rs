pub fn get_probe_version() -> String {
    clap::crate_version!().to_string()
}

/// The User-Agent sent with every request.
pub fn user_agent() -> String {
    format!("{}/{}", clap::crate_name!(), get_probe_version())
}

pub fn print_version() {
    println!("cenarius-probe version: {}", get_probe_version())
}
