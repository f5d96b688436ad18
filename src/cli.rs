use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Native MIDI transport demo", long_about = None)]
pub struct Args {
    /// Print the MIDI endpoint topology and exit
    #[arg(long)]
    pub list: bool,

    /// Monitor a source endpoint, printing every inbound packet
    #[arg(long, value_name = "ENDPOINT")]
    pub monitor: Option<u64>,

    /// Send a middle-C test note to a destination endpoint
    #[arg(long, value_name = "ENDPOINT")]
    pub test_note: Option<u64>,

    /// MIDI client name to register with the OS
    #[arg(long, default_value = "umplink")]
    pub client_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["umplink"]).unwrap();
        assert!(!args.list);
        assert_eq!(args.monitor, None);
        assert_eq!(args.test_note, None);
        assert_eq!(args.client_name, "umplink");
    }

    #[test]
    fn endpoint_arguments_parse_as_integers() {
        let args =
            Args::try_parse_from(["umplink", "--monitor", "5", "--client-name", "demo"]).unwrap();
        assert_eq!(args.monitor, Some(5));
        assert_eq!(args.client_name, "demo");
    }

    #[test]
    fn rejects_non_numeric_endpoint() {
        assert!(Args::try_parse_from(["umplink", "--test-note", "synth"]).is_err());
    }
}
