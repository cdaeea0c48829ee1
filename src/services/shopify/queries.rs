//! GraphQL documents used against the Shopify APIs.

/// Storefront API: create a checkout from line items.
pub const CREATE_CHECKOUT: &str = r#"
  mutation checkoutCreate($input: CheckoutCreateInput!) {
    checkoutCreate(input: $input) {
      checkout {
        id
        webUrl
      }
      checkoutUserErrors {
        code
        field
        message
      }
    }
  }
"#;

/// Storefront API: add line items to an existing checkout.
pub const ADD_LINE_ITEMS: &str = r#"
  mutation checkoutLineItemsAdd($checkoutId: ID!, $lineItems: [CheckoutLineItemInput!]!) {
    checkoutLineItemsAdd(checkoutId: $checkoutId, lineItems: $lineItems) {
      checkout {
        id
        webUrl
      }
      checkoutUserErrors {
        code
        field
        message
      }
    }
  }
"#;

/// Admin API: publish a product to a sales channel.
pub const PUBLISHABLE_PUBLISH: &str = r#"
  mutation publishablePublish($id: ID!, $input: [PublicationInput!]!) {
    publishablePublish(id: $id, input: $input) {
      userErrors {
        field
        message
      }
    }
  }
"#;
