use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use fastps_control::{
    BroadcastTransport, Command, DeviceEntry, FastPacket, FastSender, MulticastTransport, Route,
    Transport, TransportTarget, DEFAULT_PORT,
};

fn listener() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

fn receive(socket: &UdpSocket) -> FastPacket {
    let mut buf = [0u8; 2048];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    FastPacket::parse(&buf[..len]).unwrap()
}

#[test]
fn test_broadcast_transport_delivers_packet() {
    let (socket, port) = listener();
    let transport = BroadcastTransport::new(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));

    let sender = FastSender::new();
    let sent = sender
        .send(
            &transport,
            Command::SETPOINT,
            &[DeviceEntry::new(1001, 2.5), DeviceEntry::new(1002, -1.25)],
        )
        .unwrap();
    assert_eq!(sent, 24);

    let packet = receive(&socket);
    assert_eq!(
        packet.entries,
        vec![DeviceEntry::new(1001, 2.5), DeviceEntry::new(1002, -1.25)]
    );
}

#[test]
fn test_unicast_groups_one_packet_per_host() {
    let (first, first_port) = listener();
    let (second, second_port) = listener();
    assert_ne!(first_port, second_port);

    // Same host, two ports: send each device to its own listener
    let sender = FastSender::new();
    let a = sender.send_unicast(
        &[Route::new(
            Ipv4Addr::LOCALHOST.into(),
            DeviceEntry::new(1001, 1.0),
        )],
        first_port,
        Command::SETPOINT,
    );
    let b = sender.send_unicast(
        &[Route::new(
            Ipv4Addr::LOCALHOST.into(),
            DeviceEntry::new(1002, 2.0),
        )],
        second_port,
        Command::SETPOINT,
    );
    assert!(a[0].is_ok() && b[0].is_ok());

    let p1 = receive(&first);
    let p2 = receive(&second);
    assert_eq!(p1.addresses(), vec![1001]);
    assert_eq!(p2.addresses(), vec![1002]);
    assert_ne!(p1.nonce, p2.nonce);
}

#[test]
fn test_dynamic_transport_from_target() {
    let (socket, port) = listener();
    let target = TransportTarget::Unicast {
        destination: SocketAddrV4::new(Ipv4Addr::LOCALHOST, port).into(),
    };
    let transport = target.into_transport().unwrap();

    FastSender::new()
        .send(transport.as_ref(), Command(0x0001), &[DeviceEntry::new(7, 0.5)])
        .unwrap();

    let packet = receive(&socket);
    assert_eq!(packet.command, Command(0x0001));
    assert_eq!(packet.entries, vec![DeviceEntry::new(7, 0.5)]);
}

#[test]
fn test_multicast_defaults_before_send() {
    let transport = MulticastTransport::new(
        SocketAddrV4::new(Ipv4Addr::new(224, 0, 2, 22), DEFAULT_PORT),
        Ipv4Addr::UNSPECIFIED,
    )
    .unwrap();

    let socket = transport.open_socket().unwrap();
    assert_eq!(socket.multicast_ttl_v4().unwrap(), 1);
    assert!(socket.multicast_loop_v4().unwrap());
    assert_eq!(transport.destination().port(), 30721);
}
