use super::{ModuleCode, ModuleValue};
use crate::error::{AcouseaError, Result};
use crate::routing::Address;
use std::collections::BTreeMap;

/// Local address, static routes and the default gateway.
///
/// Value layout: `[local][destination, next_hop]*[default_gateway]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkModule {
    pub local_address: Address,
    pub routing_table: BTreeMap<Address, Address>,
    pub default_gateway: Address,
}

impl NetworkModule {
    pub fn new(local_address: Address, default_gateway: Address) -> Self {
        Self {
            local_address,
            routing_table: BTreeMap::new(),
            default_gateway,
        }
    }

    pub fn with_route(mut self, destination: Address, next_hop: Address) -> Self {
        self.routing_table.insert(destination, next_hop);
        self
    }
}

impl ModuleValue for NetworkModule {
    const CODE: ModuleCode = ModuleCode::Network;

    fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(2 + self.routing_table.len() * 2);
        value.push(self.local_address.value());
        for (destination, next_hop) in &self.routing_table {
            value.push(destination.value());
            value.push(next_hop.value());
        }
        value.push(self.default_gateway.value());
        value
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        if value.len() < 2 || value.len() % 2 != 0 {
            return Err(AcouseaError::ModuleLength {
                code: Self::CODE,
                expected: if value.len() < 2 { 2 } else { value.len() + 1 },
                actual: value.len(),
            });
        }
        let (local, rest) = value.split_at(1);
        let (routes, gateway) = rest.split_at(rest.len() - 1);

        let mut module = NetworkModule::new(local[0].into(), gateway[0].into());
        for pair in routes.chunks_exact(2) {
            let destination = Address::from(pair[0]);
            if module.routing_table.insert(destination, pair[1].into()).is_some() {
                return Err(AcouseaError::InvalidPayload(format!(
                    "duplicate route for {destination}"
                )));
            }
        }
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let module = NetworkModule::new(Address::new(3), Address::BACKEND).with_route(Address::new(9), Address::new(4));
        let bytes = module.encode_value();
        assert_eq!(bytes, vec![3, 9, 4, 0]);
        let decoded = NetworkModule::decode_value(&bytes).unwrap();
        assert_eq!(decoded.routing_table[&Address::new(9)], Address::new(4));
        assert_eq!(decoded.default_gateway, Address::BACKEND);
    }

    #[test]
    fn test_odd_length_rejected() {
        assert!(NetworkModule::decode_value(&[3, 9, 0]).is_err());
        assert!(NetworkModule::decode_value(&[3]).is_err());
    }
}
