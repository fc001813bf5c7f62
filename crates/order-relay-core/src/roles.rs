//! Role vocabulary: `Role`, `RoleTemplate`, and the handoff rules between them.

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::order::OrderRecord;
use crate::projection::{checkout_projection, sales_projection};

/// The two participants that can own a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Sales,
    Checkout,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Sales => "sales",
            Role::Checkout => "checkout",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" => Ok(Role::Sales),
            "checkout" => Ok(Role::Checkout),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Static definition of a role. Templates are fixed at compile time.
#[derive(Debug, Clone, Copy)]
pub struct RoleTemplate {
    pub role: Role,
    pub allowed_actions: &'static [ActionKind],
    /// Behavioral instructions handed to the reasoning collaborator.
    pub directive: &'static str,
    pub projector: fn(&OrderRecord) -> String,
}

const SALES_ACTIONS: &[ActionKind] = &[
    ActionKind::AddItem,
    ActionKind::RemoveItem,
    ActionKind::UpdateCustomerInfo,
    ActionKind::TransferToCheckout,
];

const CHECKOUT_ACTIONS: &[ActionKind] = &[
    ActionKind::UpdateCustomerInfo,
    ActionKind::FinalizeOrder,
    ActionKind::TransferToSales,
];

const SALES_DIRECTIVE: &str = "You are a friendly sales assistant helping customers build their order.

Your workflow:
1. Greet the customer warmly
2. When they want an item, ask for the item, the quantity and any special requests
3. Ask one question at a time
4. Once you have all details, use add_item
5. Confirm what was added and ask if they want anything else
6. When they're ready to check out, use transfer_to_checkout

Always confirm details before adding items.";

const CHECKOUT_DIRECTIVE: &str = "You are a checkout assistant responsible for finalizing orders.

Your workflow:
1. Review the complete order with the customer
2. Confirm customer information (name, and email if they want a receipt)
3. If customer info is missing, ask for it and record it with update_customer_info
4. Once everything is confirmed, use finalize_order
5. If the customer wants to change the order, use transfer_to_sales

Ensure accuracy before finalizing.";

static SALES: RoleTemplate = RoleTemplate {
    role: Role::Sales,
    allowed_actions: SALES_ACTIONS,
    directive: SALES_DIRECTIVE,
    projector: sales_projection,
};

static CHECKOUT: RoleTemplate = RoleTemplate {
    role: Role::Checkout,
    allowed_actions: CHECKOUT_ACTIONS,
    directive: CHECKOUT_DIRECTIVE,
    projector: checkout_projection,
};

impl Role {
    pub const ALL: [Role; 2] = [Role::Sales, Role::Checkout];

    pub fn template(self) -> &'static RoleTemplate {
        match self {
            Role::Sales => &SALES,
            Role::Checkout => &CHECKOUT,
        }
    }

    pub fn allows(self, action: ActionKind) -> bool {
        self.template().allowed_actions.contains(&action)
    }

    /// Fresh projection of `order` from this role's point of view.
    pub fn project(self, order: &OrderRecord) -> String {
        (self.template().projector)(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_sales() {
        assert_eq!(Role::default(), Role::Sales);
    }

    #[test]
    fn test_templates_match_their_role() {
        for role in Role::ALL {
            assert_eq!(role.template().role, role);
            assert!(!role.template().directive.is_empty());
        }
    }

    #[test]
    fn test_each_role_owns_exactly_one_handoff() {
        assert!(Role::Sales.allows(ActionKind::TransferToCheckout));
        assert!(!Role::Sales.allows(ActionKind::TransferToSales));
        assert!(Role::Checkout.allows(ActionKind::TransferToSales));
        assert!(!Role::Checkout.allows(ActionKind::TransferToCheckout));
    }

    #[test]
    fn test_only_checkout_finalizes_and_only_sales_edits_items() {
        assert!(Role::Checkout.allows(ActionKind::FinalizeOrder));
        assert!(!Role::Sales.allows(ActionKind::FinalizeOrder));
        assert!(Role::Sales.allows(ActionKind::AddItem));
        assert!(Role::Sales.allows(ActionKind::RemoveItem));
        assert!(!Role::Checkout.allows(ActionKind::AddItem));
        assert!(!Role::Checkout.allows(ActionKind::RemoveItem));
    }

    #[test]
    fn test_role_parses_from_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("cashier".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Checkout).unwrap(), "\"checkout\"");
    }
}
