//! Step implementations, grouped by the part of the state they build.
//!
//! Each public function here has the [`super::StepFn`] signature and is only
//! reached through the descriptor table.
pub mod embed;
pub mod generate;
pub mod ingest;
pub mod parse;
pub mod persist;
pub mod plan_run;
pub mod policies;
pub mod repo;
pub mod repo_context;
pub mod report;
pub mod silver;
pub mod task;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::RuntimeConfig;
    use crate::pipeline::StepContext;
    use crate::providers::{Collaborators, FetchError, FetchedSpec, SpecFetcher};
    use std::collections::BTreeMap;

    /// Serves fixed content per reference; unknown references are not found.
    #[derive(Default)]
    pub struct MapFetcher {
        pub specs: BTreeMap<String, FetchedSpec>,
    }

    impl MapFetcher {
        pub fn with(mut self, reference: &str, content: &str, content_type: &str) -> Self {
            self.specs.insert(
                reference.to_string(),
                FetchedSpec {
                    content: content.to_string(),
                    content_type: content_type.to_string(),
                },
            );
            self
        }
    }

    impl SpecFetcher for MapFetcher {
        fn fetch(&self, spec_ref: &str) -> Result<FetchedSpec, FetchError> {
            self.specs
                .get(spec_ref)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(spec_ref.to_string()))
        }
    }

    pub fn collaborators(config: &RuntimeConfig) -> Collaborators {
        Collaborators::from_config(config).with_fetcher(MapFetcher::default())
    }

    pub fn with_context<T>(
        providers: Collaborators,
        body: impl FnOnce(&StepContext<'_>) -> T,
    ) -> T {
        let config = RuntimeConfig::default();
        let ctx = StepContext {
            config: &config,
            providers: &providers,
        };
        body(&ctx)
    }

    pub const MOCK_SPEC: &str = r##"openapi: 3.0.0
info:
  title: Mock Payments API
  version: 1.0.0
servers:
  - url: https://api.mockpayments.test
security:
  - bearerAuth: []
paths:
  /v1/checkout/sessions:
    post:
      operationId: createCheckoutSession
      summary: Create a checkout session
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/CheckoutSessionRequest'
      responses:
        '200':
          description: Created
  /v1/checkout/sessions/{id}:
    get:
      operationId: getCheckoutSession
      summary: Retrieve a checkout session
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        '200':
          description: OK
components:
  schemas:
    CheckoutSessionRequest:
      type: object
      required: [amount, currency]
      properties:
        amount:
          type: integer
        currency:
          type: string
    CheckoutSession:
      type: object
      properties:
        id:
          type: string
        url:
          type: string
        customer:
          $ref: '#/components/schemas/Customer'
        line_items:
          type: array
          items:
            $ref: '#/components/schemas/LineItem'
    Customer:
      type: object
      properties:
        id:
          type: string
        email:
          type: string
          format: email
    LineItem:
      type: object
      properties:
        price:
          type: integer
webhooks:
  checkout.session.completed:
    post:
      summary: Checkout session completed
"##;
}
