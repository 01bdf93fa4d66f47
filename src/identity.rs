//! Identity boundary. Authentication itself lives upstream: the identity
//! provider in front of this service verifies credentials and forwards the
//! caller's employee id and role as headers, which are trusted here per
//! the deployment contract. Capability checks happen once, at this
//! boundary, on the typed [`Role`], never as string comparisons inside
//! business code.

use actix_web::{
    FromRequest, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorUnauthorized},
};
use futures::future::{Ready, ready};

use crate::model::role::Role;

pub const EMPLOYEE_ID_HEADER: &str = "X-Employee-Id";
pub const ROLE_HEADER: &str = "X-Role";

pub struct Caller {
    pub employee_id: u64,
    pub role: Role,
}

impl FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let employee_id = match req
            .headers()
            .get(EMPLOYEE_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.parse::<u64>().ok())
        {
            Some(id) => id,
            None => return ready(Err(ErrorUnauthorized("Missing or invalid employee id"))),
        };

        let role = match req
            .headers()
            .get(ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.parse::<Role>().ok())
        {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Missing or invalid role"))),
        };

        ready(Ok(Caller { employee_id, role }))
    }
}

impl Caller {
    /// Approve/reject capability: HR and boss only.
    pub fn require_reviewer(&self) -> actix_web::Result<()> {
        if self.role.is_reviewer() {
            Ok(())
        } else {
            Err(ErrorForbidden("Reviewer (HR/boss) only"))
        }
    }

    /// Ledger administration capability: HR only.
    pub fn require_hr(&self) -> actix_web::Result<()> {
        if self.role == Role::Hr {
            Ok(())
        } else {
            Err(ErrorForbidden("HR only"))
        }
    }

    /// Employees see their own data; reviewers see everyone's.
    pub fn can_view(&self, employee_id: u64) -> bool {
        self.role.is_reviewer() || self.employee_id == employee_id
    }
}
