use std::net::{IpAddr, Ipv4Addr};

use portfolio_persistence_contracts::{contact::MockContactRepository, MockDatabase, MockTransaction};
use portfolio_shared_contracts::{
    id::MockIdService, rate_limit::MockRateLimitService, time::MockTimeService,
};

use crate::ContactFeatureServiceImpl;


type Sut = ContactFeatureServiceImpl<
    MockDatabase,
    MockIdService,
    MockTimeService,
    MockRateLimitService,
    MockContactRepository<MockTransaction>,
>;

const CLIENT_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
