pub mod common;

mod kube_api;
