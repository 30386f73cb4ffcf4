//! Parse-or-reject boundary functions. Handlers run these before any other
//! logic so that malformed input is turned away without touching an upstream.

use ethers::core::types::Address;

use crate::domain::error::RelayError;
use crate::infrastructure::config::Network;

/// True for `0x` followed by exactly 40 hex characters.
pub fn is_hex_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn parse_address(raw: &str) -> Result<Address, RelayError> {
    if !is_hex_address(raw) {
        return Err(RelayError::Validation(format!("Invalid address: {raw}")));
    }
    raw.parse()
        .map_err(|_| RelayError::Validation(format!("Invalid address: {raw}")))
}

fn parse_network_among(
    raw: Option<&str>,
    allowed: &[Network],
    default: Network,
) -> Result<Network, RelayError> {
    let network = match raw {
        None | Some("") => default,
        Some(name) => name
            .parse::<Network>()
            .map_err(RelayError::Validation)?,
    };
    if !allowed.contains(&network) {
        return Err(RelayError::Validation(format!(
            "Network not supported here: {network}"
        )));
    }
    Ok(network)
}

/// Networks accepted by the read-only query endpoints. Defaults to mainnet.
pub fn parse_query_network(raw: Option<&str>) -> Result<Network, RelayError> {
    parse_network_among(raw, &[Network::Mainnet, Network::Sepolia], Network::Mainnet)
}

/// Networks minting is offered on. Defaults to the local dev chain.
pub fn parse_mint_network(raw: Option<&str>) -> Result<Network, RelayError> {
    parse_network_among(
        raw,
        &[Network::Sepolia, Network::Localhost],
        Network::Localhost,
    )
}

/// Any known network. Defaults to mainnet.
pub fn parse_any_network(raw: Option<&str>) -> Result<Network, RelayError> {
    parse_network_among(
        raw,
        &[Network::Mainnet, Network::Sepolia, Network::Localhost],
        Network::Mainnet,
    )
}

/// Token ids arrive as decimal strings in query parameters.
pub fn parse_token_id(raw: &str) -> Result<u64, RelayError> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(RelayError::Validation(format!("Invalid token id: {raw}")));
    }
    raw.parse()
        .map_err(|_| RelayError::Validation(format!("Invalid token id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_addresses() {
        assert!(is_hex_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6"));
        assert!(is_hex_address("0x0000000000000000000000000000000000000000"));
        assert!(parse_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_hex_address("742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6")); // no 0x
        assert!(!is_hex_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b")); // too short
        assert!(!is_hex_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b67")); // too long
        assert!(!is_hex_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8bg")); // bad char
        assert!(!is_hex_address("0x"));
        assert!(!is_hex_address(""));
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn query_network_defaults_to_mainnet() {
        assert_eq!(parse_query_network(None), Ok(Network::Mainnet));
        assert_eq!(parse_query_network(Some("")), Ok(Network::Mainnet));
        assert_eq!(parse_query_network(Some("sepolia")), Ok(Network::Sepolia));
    }

    #[test]
    fn query_network_rejects_unknown_and_out_of_scope() {
        assert!(parse_query_network(Some("goerli")).is_err());
        // localhost is a known network but not served by the query endpoints
        assert!(parse_query_network(Some("localhost")).is_err());
    }

    #[test]
    fn mint_network_defaults_to_localhost() {
        assert_eq!(parse_mint_network(None), Ok(Network::Localhost));
        assert_eq!(parse_mint_network(Some("sepolia")), Ok(Network::Sepolia));
        assert!(parse_mint_network(Some("mainnet")).is_err());
    }

    #[test]
    fn any_network_accepts_all_three() {
        assert_eq!(parse_any_network(Some("localhost")), Ok(Network::Localhost));
        assert_eq!(parse_any_network(None), Ok(Network::Mainnet));
        assert!(parse_any_network(Some("ropsten")).is_err());
    }

    #[test]
    fn token_id_must_be_decimal_digits() {
        assert_eq!(parse_token_id("0"), Ok(0));
        assert_eq!(parse_token_id("17"), Ok(17));
        assert!(parse_token_id("").is_err());
        assert!(parse_token_id("-1").is_err());
        assert!(parse_token_id("0x10").is_err());
        assert!(parse_token_id("12.5").is_err());
    }
}
