// src/routes/proposal_routes.rs

use actix_web::web;

use crate::controllers::proposal_controller::{
    decide_proposal, get_proposal, job_proposals, my_proposals, submit_proposal,
    update_proposal, withdraw_proposal,
};

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/proposals")
            .service(submit_proposal)
            .service(my_proposals)
            .service(job_proposals)
            .service(decide_proposal)
            .service(get_proposal)
            .service(update_proposal)
            .service(withdraw_proposal),
    );
}
