// src/routes/job_routes.rs

use actix_web::web;

use crate::controllers::job_controller::{
    create_job, delete_job, get_job, list_jobs, my_jobs, update_job,
};

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/jobs")
            .service(create_job)
            .service(list_jobs)
            .service(my_jobs)
            .service(get_job)
            .service(update_job)
            .service(delete_job),
    );
}
