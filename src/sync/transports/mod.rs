//! Transport implementations for talking to hosting services

pub mod bitbucket;

pub use bitbucket::BitbucketTransport;
