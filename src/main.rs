use chrono::Utc;
use multipaxos::{try_create_paxos_replica, PaxosMemberInfo, PaxosOptions, PaxosReplicaConfig};
use slog::Drain;
use std::error::Error;
use std::fs::OpenOptions;
use std::net::SocketAddrV4;

const USAGE: &str = "usage: multipaxos <my-replica-id> <ip:port> [<ip:port> ...]

Member i of the cluster is the i-th address, starting at 0. Set PAXOS_LOG_DIR to log to a file
instead of stderr.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let my_replica_id: i32 = args[0].parse()?;
    let cluster_members = parse_members(&args[1..])?;

    let info_logger = match std::env::var("PAXOS_LOG_DIR") {
        Ok(directory) => create_root_logger_for_file(&directory, my_replica_id)?,
        Err(_) => create_root_logger_for_stderr(),
    };

    let mut replica = try_create_paxos_replica(PaxosReplicaConfig {
        my_replica_id,
        cluster_members,
        info_logger: info_logger.clone(),
        options: PaxosOptions::default(),
    })
    .await?;

    let mut leader_changes = replica.subscribe_leader_changes();
    slog::info!(info_logger, "Replica is up. Current leader is {:?}", replica.leader());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = leader_changes.next() => match change {
                Some(change) => slog::info!(info_logger, "Leader is now {:?}", change.leader),
                None => break,
            },
        }
    }

    replica.shutdown();
    slog::info!(info_logger, "Replica has shut down");

    Ok(())
}

fn parse_members(addresses: &[String]) -> Result<Vec<PaxosMemberInfo>, Box<dyn Error>> {
    let mut cluster_members = Vec::with_capacity(addresses.len());
    for (replica_id, address) in addresses.iter().enumerate() {
        let address: SocketAddrV4 = address.parse()?;
        cluster_members.push(PaxosMemberInfo {
            replica_id: replica_id as i32,
            ip_addr: *address.ip(),
            rpc_port: address.port(),
        });
    }

    Ok(cluster_members)
}

fn create_root_logger_for_file(directory: &str, replica_id: i32) -> Result<slog::Logger, Box<dyn Error>> {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let log_path = format!("{}/replica_{}_{}_info.log", directory, replica_id, now);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(slog::Logger::root(drain, slog::o!()))
}

fn create_root_logger_for_stderr() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
