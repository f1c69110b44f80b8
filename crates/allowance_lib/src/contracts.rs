use lazy_static::lazy_static;

use crate::{err_custom_create, err_from};
use crate::error::ResolverError;
use allowance_rpc::QueryDescriptor;
use std::str::FromStr;
use web3::contract::tokens::Tokenize;
use web3::contract::Contract;
use web3::transports::Http;
use web3::types::Address;
use web3::{Transport, Web3};

lazy_static! {
    pub static ref DUMMY_RPC_PROVIDER: Web3<Http> = {
        let transport = web3::transports::Http::new("http://noconn").unwrap();
        Web3::new(transport)
    };
    pub static ref ERC20_CONTRACT_TEMPLATE: Contract<Http> =
        prepare_contract_template(include_bytes!("../contracts/ierc20.json")).unwrap();
}

pub fn prepare_contract_template(json_abi: &[u8]) -> Result<Contract<Http>, ResolverError> {
    let contract = Contract::from_json(
        DUMMY_RPC_PROVIDER.eth(),
        Address::from_str("0x0000000000000000000000000000000000000000").unwrap(),
        json_abi,
    )
    .map_err(|err| err_custom_create!("Failed to create contract {err}"))?;

    Ok(contract)
}

pub fn contract_encode<P, T>(
    contract: &Contract<T>,
    func: &str,
    params: P,
) -> Result<Vec<u8>, web3::ethabi::Error>
where
    P: Tokenize,
    T: Transport,
{
    contract
        .abi()
        .function(func)
        .and_then(|function| function.encode_input(&params.into_tokens()))
}

pub fn encode_erc20_balance_of(address: Address) -> Result<Vec<u8>, web3::ethabi::Error> {
    contract_encode(&ERC20_CONTRACT_TEMPLATE, "balanceOf", (address,))
}

pub fn encode_erc20_allowance(
    owner: Address,
    spender: Address,
) -> Result<Vec<u8>, web3::ethabi::Error> {
    contract_encode(&ERC20_CONTRACT_TEMPLATE, "allowance", (owner, spender))
}

pub fn encode_erc20_decimals() -> Result<Vec<u8>, web3::ethabi::Error> {
    contract_encode(&ERC20_CONTRACT_TEMPLATE, "decimals", ())
}

pub fn balance_of_query(token: Address, owner: Address) -> Result<QueryDescriptor, ResolverError> {
    Ok(QueryDescriptor {
        method: "balanceOf",
        to: token,
        data: encode_erc20_balance_of(owner)
            .map_err(err_from!())?,
    })
}

pub fn allowance_query(
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<QueryDescriptor, ResolverError> {
    Ok(QueryDescriptor {
        method: "allowance",
        to: token,
        data: encode_erc20_allowance(owner, spender)
            .map_err(err_from!())?,
    })
}

pub fn decimals_query(token: Address) -> Result<QueryDescriptor, ResolverError> {
    Ok(QueryDescriptor {
        method: "decimals",
        to: token,
        data: encode_erc20_decimals()
            .map_err(err_from!())?,
    })
}
