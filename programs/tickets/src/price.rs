use crate::errors::TicketsError;
use crate::types::Amount;

/// Accept only a payment of exactly `unit_price`. No change is made for overpayment.
pub fn check(attached: Amount, unit_price: Amount) -> Result<(), TicketsError> {
    if attached != unit_price {
        return Err(TicketsError::WrongPrice {
            expected: unit_price,
            attached,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TICKET_PRICE;
    use proptest::prelude::*;

    #[test]
    fn exact_price_passes() {
        assert_eq!(check(TICKET_PRICE, TICKET_PRICE), Ok(()));
    }

    #[test]
    fn ten_times_price_names_the_price() {
        let err = check(Amount::from_wei(1_000_000_000_000_000_000), TICKET_PRICE).unwrap_err();
        assert_eq!(err.to_string(), "Tickets: Tickets go for 0.1 ETH each.");
    }

    proptest! {
        #[test]
        fn any_other_amount_is_rejected(wei in any::<u128>()) {
            prop_assume!(wei != TICKET_PRICE.wei());
            let attached = Amount::from_wei(wei);
            prop_assert_eq!(
                check(attached, TICKET_PRICE),
                Err(TicketsError::WrongPrice { expected: TICKET_PRICE, attached })
            );
        }
    }
}
