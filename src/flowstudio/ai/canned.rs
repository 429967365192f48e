//! Offline diagrams, picked by keyword.

use super::DiagramGenerator;
use crate::error::Result;

const LOGIN_KEYWORDS: &[&str] = &["登录", "认证", "login"];
const ORDER_KEYWORDS: &[&str] = &["订单", "下单", "order"];
const CLASS_KEYWORDS: &[&str] = &["类", "class"];

const LOGIN_SEQUENCE: &str = r#"@startuml
!theme plain
skinparam backgroundColor #FEFEFE

actor User
participant "Frontend" as FE
participant "Auth Service" as Auth
database "User DB" as DB

User -> FE: enter credentials
FE -> Auth: login request
Auth -> DB: look up user
DB --> Auth: user record
Auth -> Auth: verify password

alt credentials valid
    Auth --> FE: session token
    FE --> User: signed in
else credentials invalid
    Auth --> FE: error
    FE --> User: show error
end

@enduml"#;

const ORDER_SEQUENCE: &str = r#"@startuml
!theme plain
skinparam backgroundColor #FEFEFE

actor Customer
participant "Order Service" as Order
participant "Inventory" as Stock
participant "Payments" as Pay
database "Order DB" as DB

Customer -> Order: place order
Order -> Stock: reserve items
Stock --> Order: reserved
Order -> DB: store order (pending payment)
Order --> Customer: order created

Customer -> Pay: pay
Pay -> DB: mark order paid
DB --> Pay: ok
Pay --> Customer: payment confirmed

@enduml"#;

const CLASS_DIAGRAM: &str = r#"@startuml
!theme plain
skinparam backgroundColor #FEFEFE

class User {
  - id: Long
  - username: String
  - email: String
  + login(): Boolean
  + logout(): void
}

class Order {
  - id: Long
  - userId: Long
  - total: BigDecimal
  - status: OrderStatus
  + pay(): Boolean
  + cancel(): Boolean
}

class Product {
  - id: Long
  - name: String
  - price: BigDecimal
  - stock: Integer
  + inStock(): Boolean
}

User "1" --> "*" Order : places
Order "*" --> "1" Product : contains

@enduml"#;

const ACTIVITY_FLOW: &str = r#"@startuml
!theme plain
skinparam backgroundColor #FEFEFE

title Request Flow

|User|
start
:describe the request;

|System|
:handle request;
if (valid?) then (yes)
  :run business logic;
  :return result;
else (no)
  :return error;
endif

|User|
:review result;

stop

@enduml"#;

/// Pick the canned diagram matching the description's keywords.
///
/// Checked in order: login, order, class. Anything else gets an activity flow.
pub fn canned_diagram(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if mentions(LOGIN_KEYWORDS) {
        LOGIN_SEQUENCE
    } else if mentions(ORDER_KEYWORDS) {
        ORDER_SEQUENCE
    } else if mentions(CLASS_KEYWORDS) {
        CLASS_DIAGRAM
    } else {
        ACTIVITY_FLOW
    }
}

/// Generator that never leaves the machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedGenerator;

impl DiagramGenerator for CannedGenerator {
    fn generate(&self, description: &str) -> Result<String> {
        Ok(canned_diagram(description).to_string())
    }
}
